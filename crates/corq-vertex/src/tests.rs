//! Snapshot tests for the Vertex AI client configuration

#[cfg(test)]
mod snapshot_tests {
    use crate::VertexConfig;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_config_snapshot() {
        let config = VertexConfig {
            project_id: "test-project".to_string(),
            location: "us-central1".to_string(),
            model_id: "gemini-2.5-flash".to_string(),
            temperature: 0.5,
            max_tokens: 8192,
            credentials_path: None,
        };

        assert_yaml_snapshot!(config, @r###"
        ---
        project_id: test-project
        location: us-central1
        model_id: gemini-2.5-flash
        temperature: 0.5
        max_tokens: 8192
        credentials_path: ~
        "###);
    }

    #[test]
    fn test_api_host_follows_location() {
        let config = VertexConfig::new("p", "europe-west4");
        assert_eq!(config.api_host(), "europe-west4-aiplatform.googleapis.com");
    }

    #[test]
    fn test_rag_endpoint() {
        let config = VertexConfig::new("test-project", "us-central1");
        assert_eq!(
            config.rag_endpoint("projects/test-project/locations/us-central1:retrieveContexts"),
            "https://us-central1-aiplatform.googleapis.com/v1beta1/projects/test-project/locations/us-central1:retrieveContexts"
        );
    }

    #[test]
    fn test_location_path() {
        let config = VertexConfig::new("test-project", "us-central1");
        assert_eq!(
            config.location_path(),
            "projects/test-project/locations/us-central1"
        );
    }

    #[test]
    fn test_generation_config_carries_model_parameters() {
        let mut config = VertexConfig::new("p", "us-central1");
        config.temperature = 0.25;
        config.max_tokens = 1024;

        let generation = config.generation_config();
        assert_eq!(generation.model_id, "gemini-2.5-flash");
        assert_eq!(generation.temperature, Some(0.25));
        assert_eq!(generation.max_tokens, 1024);
    }
}
