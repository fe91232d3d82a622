use std::collections::BTreeMap;

use ocfl_checksum::checksum_reader;
use ocfl_fs::{join_path, Filesystem};
use ocfl_inventory::{ValidationIssue, ValidationReport, INVENTORY_FILE};
use ocfl_types::DigestAlgorithm;
use tracing::{debug, info};

use crate::error::ObjectResult;
use crate::session::read_inventory;
use crate::OBJECT_NAMASTE;

/// Validate the object stored in `fs`.
///
/// An unreadable or unverifiable root inventory is an error. Everything
/// else becomes an issue in the report: structural problems of the
/// inventory, a head version inventory that differs from the root one, and
/// content files that are missing, unlisted or fail their digests.
pub fn validate_object(fs: &dyn Filesystem) -> ObjectResult<ValidationReport> {
    let mut report = ValidationReport::new();
    if !fs.exists(OBJECT_NAMASTE)? {
        report.push(ValidationIssue::error(
            "E003",
            "object declaration file is missing",
            OBJECT_NAMASTE,
        ));
    }

    let inventory = read_inventory(fs, "")?;
    report.extend(inventory.validate().issues);

    if let Some(head) = inventory.head() {
        let copy = join_path(&head.to_string(), INVENTORY_FILE);
        if fs.exists(&copy)? {
            if fs.read_to_vec(&copy)? != fs.read_to_vec(INVENTORY_FILE)? {
                report.push(ValidationIssue::error(
                    "E064",
                    "head version inventory differs from the root inventory",
                    copy.as_str(),
                ));
            }
        } else {
            report.push(ValidationIssue::warning(
                "W010",
                "head version directory has no inventory",
                head.to_string(),
            ));
        }
    }

    let mut algorithms = vec![inventory.digest_algorithm()];
    algorithms.extend(inventory.fixity().keys().copied());

    let mut found: BTreeMap<String, BTreeMap<DigestAlgorithm, String>> = BTreeMap::new();
    for version in inventory.versions().keys() {
        let prefix = format!("{version}/{}/", inventory.content_directory());
        let content_dir = prefix.trim_end_matches('/');
        if !fs.exists(content_dir)? {
            continue;
        }
        for path in fs.walk(content_dir)? {
            let digests = checksum_reader(fs.open(&path)?, &algorithms)?;
            found.insert(path, digests);
        }
    }
    debug!(id = %inventory.id(), files = found.len(), "content digested");
    report.extend(inventory.check_files(&found));

    info!(
        id = %inventory.id(),
        valid = report.is_valid(),
        errors = report.errors().count(),
        "object validated"
    );
    Ok(report)
}
