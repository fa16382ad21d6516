use crate::app::Gate;
use crate::config::cli::NulBytesArgs;
use crate::core::nul_bytes::check_files;

pub fn run(args: &NulBytesArgs) -> Gate {
    let offenders = check_files(&args.files);
    for path in &offenders {
        eprintln!("ERROR: NUL byte detected in {}", path.display());
    }
    Gate::from_failures(!offenders.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fails_on_nul_byte() {
        let dir = TempDir::new().unwrap();
        let clean = dir.path().join("ok.txt");
        let dirty = dir.path().join("bad.bin");
        std::fs::write(&clean, "hello\n").unwrap();
        std::fs::write(&dirty, b"he\0llo").unwrap();

        let pass = run(&NulBytesArgs { files: vec![clean.clone()] });
        assert_eq!(pass, Gate::Pass);
        let fail = run(&NulBytesArgs { files: vec![clean, dirty] });
        assert_eq!(fail, Gate::Fail);
    }
}
