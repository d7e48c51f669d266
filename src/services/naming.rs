//! Report filename convention: `report_<Department>_<date>.xml`

pub const REPORT_PREFIX: &str = "report_";
pub const REPORT_EXTENSION: &str = ".xml";

/// Whether the transfer cycle should pick this file up.
#[must_use]
pub fn is_report_file(filename: &str) -> bool {
    filename.ends_with(REPORT_EXTENSION)
}

/// Department between the prefix and the first `_`, or the extension when
/// there is no date part.
#[must_use]
pub fn department_from_filename(filename: &str) -> Option<&str> {
    let rest = filename.strip_prefix(REPORT_PREFIX)?;
    let end = rest.find('_').or_else(|| rest.find(REPORT_EXTENSION))?;
    let department = &rest[..end];
    (!department.is_empty()).then_some(department)
}
