// ABOUTME: Integration tests for validated identifier types.
// ABOUTME: Tests parsing and validation of service names, branch names and run ids.

use tandem::types::*;

mod service_name_tests {
    use super::*;

    #[test]
    fn valid_dns_name() {
        let name = ServiceName::new("my-service").unwrap();
        assert_eq!(name.as_str(), "my-service");
    }

    #[test]
    fn empty_returns_error() {
        assert!(ServiceName::new("").is_err());
    }

    #[test]
    fn too_long_returns_error() {
        let long_name = "a".repeat(64);
        assert!(ServiceName::new(&long_name).is_err());
    }

    #[test]
    fn starts_with_hyphen_returns_error() {
        assert!(ServiceName::new("-service").is_err());
    }

    #[test]
    fn underscores_are_allowed_inside() {
        assert_eq!(
            ServiceName::new("power_monitor").unwrap().as_str(),
            "power_monitor"
        );
        assert!(ServiceName::new("_private").is_err());
        assert!(ServiceName::new("trailing_").is_err());
    }

    #[test]
    fn uppercase_returns_error() {
        assert!(ServiceName::new("MyService").is_err());
    }

    #[test]
    fn valid_63_chars() {
        let name = "a".repeat(63);
        assert!(ServiceName::new(&name).is_ok());
    }
}

mod branch_name_tests {
    use super::*;

    #[test]
    fn accepts_nested_branches() {
        assert_eq!(BranchName::new("release/2.1").unwrap().as_str(), "release/2.1");
        assert_eq!(BranchName::new("feature/power_meter-v2").unwrap().as_str(), "feature/power_meter-v2");
    }

    #[test]
    fn default_is_main() {
        assert_eq!(BranchName::default().as_str(), "main");
    }

    #[test]
    fn rejects_shell_and_ref_hazards() {
        assert_eq!(BranchName::new(""), Err(BranchNameError::Empty));
        assert_eq!(BranchName::new("-f"), Err(BranchNameError::BadStart));
        assert_eq!(BranchName::new("topic/"), Err(BranchNameError::BadEnd));
        assert_eq!(BranchName::new("main.lock"), Err(BranchNameError::BadEnd));
        assert_eq!(BranchName::new("a..b"), Err(BranchNameError::BadSequence));
        assert_eq!(BranchName::new("main;rm"), Err(BranchNameError::InvalidChar(';')));
        assert_eq!(BranchName::new("my branch"), Err(BranchNameError::InvalidChar(' ')));
    }
}

mod run_id_tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RunId::generate();
        let b = RunId::generate();
        assert_ne!(a, b);
    }
}
