use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Read, Write};

use ocfl_types::{DigestAlgorithm, ErrorList};
use tracing::debug;

use crate::error::{ChecksumError, ChecksumResult};
use crate::hasher::new_hasher;
use crate::pipe::FanOutGroup;

const RUNNER_BUFFER: usize = 64 * 1024;

type RunnerResult = Result<String, String>;

/// Computes several digests of one byte stream concurrently, optionally
/// teeing the bytes to underlying writers.
///
/// Each algorithm gets a runner thread reading from its own rendezvous
/// pipe. `write` returns once every runner has accepted the chunk and every
/// underlying writer has written it in full.
///
/// ```
/// use std::io::Write;
/// use ocfl_checksum::{ChecksumWriter, DigestAlgorithm};
///
/// let mut writer = ChecksumWriter::new(&[DigestAlgorithm::Sha256], Vec::new()).unwrap();
/// writer.write_all(b"hello").unwrap();
/// writer.close().unwrap();
/// let sums = writer.checksums().unwrap();
/// assert_eq!(sums.len(), 1);
/// ```
pub struct ChecksumWriter<'w> {
    runners: Option<FanOutGroup<RunnerResult>>,
    writers: Vec<Box<dyn Write + Send + 'w>>,
    checksums: Option<BTreeMap<DigestAlgorithm, String>>,
    bytes_written: u64,
    failed: bool,
}

impl<'w> ChecksumWriter<'w> {
    /// Start one runner per distinct algorithm.
    pub fn new(
        algorithms: &[DigestAlgorithm],
        writers: Vec<Box<dyn Write + Send + 'w>>,
    ) -> ChecksumResult<Self> {
        let distinct: BTreeSet<DigestAlgorithm> = algorithms.iter().copied().collect();
        if distinct.is_empty() {
            return Err(ChecksumError::Configuration(
                "at least one digest algorithm is required".into(),
            ));
        }

        let mut runners = FanOutGroup::new();
        for algorithm in distinct {
            runners.spawn(algorithm.as_str(), move |reader| {
                let mut hasher = new_hasher(algorithm);
                let mut buf = vec![0u8; RUNNER_BUFFER];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => hasher.update(&buf[..n]),
                        Err(e) => return Err(e.to_string()),
                    }
                }
                Ok(hex::encode(hasher.finalize()))
            })?;
        }

        Ok(Self {
            runners: Some(runners),
            writers,
            checksums: None,
            bytes_written: 0,
            failed: false,
        })
    }

    /// Like [`Self::new`], but from algorithm identifiers as found in configs.
    pub fn from_names(
        names: &[&str],
        writers: Vec<Box<dyn Write + Send + 'w>>,
    ) -> ChecksumResult<Self> {
        let algorithms = names
            .iter()
            .map(|name| {
                name.parse::<DigestAlgorithm>()
                    .map_err(|e| ChecksumError::Configuration(e.to_string()))
            })
            .collect::<ChecksumResult<Vec<_>>>()?;
        Self::new(&algorithms, writers)
    }

    /// Total bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Signal end of stream, wait for every runner, and combine failures.
    ///
    /// Once any `write` has failed, `close` joins the runners and returns
    /// [`ChecksumError::WriteFailed`], now and on every later call. Calling
    /// `close` again after success is a no-op.
    pub fn close(&mut self) -> ChecksumResult<()> {
        let Some(runners) = self.runners.take() else {
            return if self.failed {
                Err(ChecksumError::WriteFailed)
            } else {
                Ok(())
            };
        };
        if self.failed {
            runners.finish();
            debug!(bytes = self.bytes_written, "checksum writer closed after a failed write");
            return Err(ChecksumError::WriteFailed);
        }

        let mut errors = ErrorList::new();
        for writer in &mut self.writers {
            errors.collect(writer.flush().map_err(ChecksumError::Io));
        }

        let mut checksums = BTreeMap::new();
        for outcome in runners.finish() {
            let algorithm: DigestAlgorithm = match outcome.label.parse() {
                Ok(alg) => alg,
                Err(e) => {
                    errors.push(ChecksumError::Configuration(e.to_string()));
                    continue;
                }
            };
            match outcome.result {
                Ok(Ok(hex)) => {
                    checksums.insert(algorithm, hex);
                }
                Ok(Err(message)) | Err(message) => {
                    errors.push(ChecksumError::Runner { algorithm, message });
                }
            }
        }

        debug!(
            bytes = self.bytes_written,
            digests = checksums.len(),
            failures = errors.len(),
            "checksum writer closed"
        );
        errors.into_result(ChecksumError::Aggregate)?;
        self.checksums = Some(checksums);
        Ok(())
    }

    /// Algorithm to lowercase hex digest; only available after [`Self::close`].
    pub fn checksums(&self) -> ChecksumResult<&BTreeMap<DigestAlgorithm, String>> {
        self.checksums.as_ref().ok_or(ChecksumError::NotClosed)
    }

    /// Take the digests out, closing first if needed.
    pub fn into_checksums(mut self) -> ChecksumResult<BTreeMap<DigestAlgorithm, String>> {
        self.close()?;
        self.checksums.take().ok_or(ChecksumError::NotClosed)
    }
}

impl Write for ChecksumWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let runners = self.runners.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::BrokenPipe, "checksum writer is closed")
        })?;
        let gone = runners.send(buf);
        if !gone.is_empty() {
            self.failed = true;
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("digest runner(s) exited early: {}", gone.join(", ")),
            ));
        }
        for writer in &mut self.writers {
            if let Err(e) = writer.write_all(buf) {
                self.failed = true;
                return Err(e);
            }
        }
        self.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for writer in &mut self.writers {
            writer.flush()?;
        }
        Ok(())
    }
}

/// Copy `reader` through a [`ChecksumWriter`] and return the digests.
pub fn checksum_reader<R: Read>(
    mut reader: R,
    algorithms: &[DigestAlgorithm],
) -> ChecksumResult<BTreeMap<DigestAlgorithm, String>> {
    let mut writer = ChecksumWriter::new(algorithms, Vec::new())?;
    io::copy(&mut reader, &mut writer)?;
    writer.into_checksums()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::digest_bytes;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    /// A writer that appends into shared storage so tests can inspect it.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn one_entry_per_algorithm() {
        let algs = [
            DigestAlgorithm::Sha512,
            DigestAlgorithm::Md5,
            DigestAlgorithm::Blake2b160,
            DigestAlgorithm::Md5,
        ];
        let sums = checksum_reader(&b"archival bytes"[..], &algs).unwrap();
        assert_eq!(sums.len(), 3);
        for (alg, hex) in &sums {
            assert_eq!(hex, &digest_bytes(*alg, b"archival bytes"));
        }
    }

    #[test]
    fn tees_bytes_to_underlying_writers() {
        let sink = Shared::default();
        let mut writer =
            ChecksumWriter::new(&[DigestAlgorithm::Sha1], vec![Box::new(sink.clone())]).unwrap();
        writer.write_all(b"first ").unwrap();
        writer.write_all(b"second").unwrap();
        writer.close().unwrap();
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"first second");
        assert_eq!(writer.bytes_written(), 12);
    }

    #[test]
    fn checksums_before_close_fail() {
        let mut writer = ChecksumWriter::new(&[DigestAlgorithm::Sha256], Vec::new()).unwrap();
        writer.write_all(b"data").unwrap();
        assert!(matches!(writer.checksums(), Err(ChecksumError::NotClosed)));
        writer.close().unwrap();
        assert!(writer.checksums().is_ok());
        // Second close is a no-op.
        writer.close().unwrap();
    }

    #[test]
    fn write_after_close_is_broken_pipe() {
        let mut writer = ChecksumWriter::new(&[DigestAlgorithm::Sha256], Vec::new()).unwrap();
        writer.close().unwrap();
        let err = writer.write(b"late").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn empty_algorithm_list_is_configuration_error() {
        let err = ChecksumWriter::new(&[], Vec::new()).err().unwrap();
        assert!(matches!(err, ChecksumError::Configuration(_)));
    }

    #[test]
    fn unknown_algorithm_name_is_configuration_error() {
        let err = ChecksumWriter::from_names(&["sha256", "crc64"], Vec::new())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ocfl_types::ErrorKind::Configuration);
    }

    #[test]
    fn underlying_writer_failure_surfaces() {
        let mut writer =
            ChecksumWriter::new(&[DigestAlgorithm::Md5], vec![Box::new(FailingWriter)]).unwrap();
        assert!(writer.write_all(b"payload").is_err());
        assert!(matches!(writer.close(), Err(ChecksumError::WriteFailed)));
        assert!(matches!(writer.close(), Err(ChecksumError::WriteFailed)));
        assert!(matches!(writer.checksums(), Err(ChecksumError::NotClosed)));

        let mut writer =
            ChecksumWriter::new(&[DigestAlgorithm::Md5], vec![Box::new(FailingWriter)]).unwrap();
        assert!(writer.write_all(b"payload").is_err());
        let err = writer.into_checksums().unwrap_err();
        assert_eq!(err.kind(), ocfl_types::ErrorKind::Integrity);
    }

    #[test]
    fn empty_stream_digests() {
        let sums = checksum_reader(io::empty(), &[DigestAlgorithm::Md5]).unwrap();
        assert_eq!(sums[&DigestAlgorithm::Md5], "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn drop_without_close_joins_runners() {
        let mut writer = ChecksumWriter::new(&DigestAlgorithm::ALL, Vec::new()).unwrap();
        writer.write_all(b"abandoned").unwrap();
        drop(writer);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn any_chunking_yields_identical_digests(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            cuts in proptest::collection::vec(1usize..512, 0..16),
        ) {
            let algs = [DigestAlgorithm::Sha256, DigestAlgorithm::Blake2b384, DigestAlgorithm::Md5];
            let mut writer = ChecksumWriter::new(&algs, Vec::new()).unwrap();
            let mut rest = data.as_slice();
            for cut in cuts {
                let n = cut.min(rest.len());
                writer.write_all(&rest[..n]).unwrap();
                rest = &rest[n..];
            }
            writer.write_all(rest).unwrap();
            let chunked = writer.into_checksums().unwrap();
            let whole = checksum_reader(data.as_slice(), &algs).unwrap();
            prop_assert_eq!(chunked, whole);
        }
    }
}
