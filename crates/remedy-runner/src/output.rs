//! Where each program leaves its output.

/// Output file each supported program writes in the job's directory.
pub fn output_file_name(software: &str) -> Option<&'static str> {
    match software.to_lowercase().as_str() {
        "gaussian" | "orca" => Some("input.log"),
        "molpro" => Some("input.out"),
        "qchem" | "terachem" | "onedmin" => Some("output.out"),
        _ => None,
    }
}
