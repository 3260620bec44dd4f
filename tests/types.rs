// ABOUTME: Tests for the validated domain types.
// ABOUTME: Tag normalization, runtime derivation, and image reference composition.

use caravel::types::{Chip, ImageRef, ModelName, ModelTag, ModelType, RegistryCoordinates, Runtime};
use proptest::prelude::*;

mod tags {
    use super::*;

    #[test]
    fn normalization_lowercases() {
        assert_eq!(ModelTag::new("MNIST").unwrap().as_str(), "mnist");
    }

    #[test]
    fn normalization_preserves_already_lowercase() {
        assert_eq!(ModelTag::new("v2-canary").unwrap().as_str(), "v2-canary");
    }

    #[test]
    fn rejects_non_dns_characters() {
        assert!(ModelTag::new("a.b").is_err());
        assert!(ModelTag::new("a_b").is_err());
        assert!(ModelTag::new("-a").is_err());
        assert!(ModelTag::new("a-").is_err());
        assert!(ModelTag::new("").is_err());
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-zA-Z0-9]([a-zA-Z0-9-]{0,20}[a-zA-Z0-9])?") {
            let once = ModelTag::new(&raw).unwrap();
            let twice = ModelTag::new(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}

mod names {
    use super::*;

    #[test]
    fn accepts_dns_labels() {
        assert!(ModelName::new("mnist").is_ok());
        assert!(ModelName::new("mnist-v2").is_ok());
    }

    #[test]
    fn rejects_uppercase_rather_than_normalizing() {
        // Names are not lossily normalized the way tags are; a bad name is
        // the caller's mistake to fix.
        assert!(ModelName::new("MNIST").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(64);
        assert!(ModelName::new(&long).is_err());
    }
}

mod runtimes {
    use super::*;

    #[test]
    fn tensorflow_serves_with_tfserving() {
        assert_eq!(ModelType::Tensorflow.default_runtime(), Runtime::TfServing);
    }

    #[test]
    fn jvm_family_serves_with_jvm() {
        for t in [
            ModelType::Java,
            ModelType::Pmml,
            ModelType::Spark,
            ModelType::Xgboost,
        ] {
            assert_eq!(t.default_runtime(), Runtime::Jvm);
        }
    }

    #[test]
    fn python_family_serves_with_python() {
        for t in [
            ModelType::Keras,
            ModelType::Python,
            ModelType::Scikit,
            ModelType::Pytorch,
        ] {
            assert_eq!(t.default_runtime(), Runtime::Python);
        }
    }

    #[test]
    fn caffe_serves_with_cpp() {
        assert_eq!(ModelType::Caffe.default_runtime(), Runtime::Cpp);
    }
}

mod image_refs {
    use super::*;

    #[test]
    fn parses_fully_qualified_reference() {
        let image = ImageRef::parse("docker.io/caravel/predict-mnist:a").unwrap();
        assert_eq!(image.registry(), Some("docker.io"));
        assert_eq!(image.name(), "caravel/predict-mnist");
        assert_eq!(image.tag(), Some("a"));
    }

    #[test]
    fn bare_name_defaults_to_latest() {
        let image = ImageRef::parse("nginx").unwrap();
        assert_eq!(image.tag(), Some("latest"));
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let image = ImageRef::parse("localhost:5000/caravel/predict-mnist").unwrap();
        assert_eq!(image.registry(), Some("localhost:5000"));
        assert_eq!(image.tag(), Some("latest"));
    }

    #[test]
    fn coordinates_compose_namespace_name_tag() {
        let coordinates = RegistryCoordinates {
            url: "docker.io".to_string(),
            repo: "caravel".to_string(),
            namespace: "predict".to_string(),
            base_tag: "1.5.0".to_string(),
            base_chip: Chip::Cpu,
        };
        let name = ModelName::new("mnist").unwrap();
        let tag = ModelTag::new("A").unwrap();
        assert_eq!(
            coordinates.image_ref(&name, &tag).to_string(),
            "docker.io/caravel/predict-mnist:a"
        );
        assert_eq!(
            coordinates.base_image_ref().to_string(),
            "docker.io/caravel/predict-cpu:1.5.0"
        );
    }
}
