#[cfg(test)]
mod router_tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::api::{app_state::AppState, create_router};
    use crate::config::config::AppConfig;
    use crate::config::roster::{GameMasterConfig, Roster, WakeCondition};
    use crate::models::agent::Agent;
    use crate::services::orchestrator::Orchestrator;
    use crate::storage::repository::SurrealWorldRepository;
    use crate::storage::surrealdb::SurrealPool;

    fn roster() -> Roster {
        let mut game_master = GameMasterConfig::default();
        game_master.wake_conditions.insert(
            "property_damage".into(),
            WakeCondition {
                radius: 15.0,
                wake_probability: 0.8,
            },
        );
        Roster {
            game_master,
            agents: vec![
                Agent::new("baker_01", "Martha Quinn", "baker")
                    .at("bakery")
                    .with_traits(&["grumpy", "hardworking"]),
                Agent::new("student_01", "Eli Park", "student")
                    .at("apartment_1a")
                    .with_traits(&["anxious"]),
            ],
        }
    }

    async fn app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("baker.lora"), b"weights").unwrap();

        let mut config = AppConfig::development();
        config.adapters.directory = dir.path().to_path_buf();

        let pool = SurrealPool::in_memory().await.unwrap();
        let orchestrator = Orchestrator::from_config(
            &config,
            Arc::new(SurrealWorldRepository::new(pool)),
            roster(),
        )
        .unwrap();
        orchestrator.sync_roster().await.unwrap();

        (create_router(AppState::new(orchestrator), &[]), dir)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (app, _dir) = app().await;
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "online");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_list_agents() {
        let (app, _dir) = app().await;
        let (status, body) = send(&app, "GET", "/agents", None).await;
        assert_eq!(status, StatusCode::OK);
        let agents = body["agents"].as_array().unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0]["id"], "baker_01");
    }

    #[tokio::test]
    async fn test_event_returns_reactions() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/event",
            Some(json!({
                "event_type": "property_damage",
                "action": "break_glass",
                "location": "bakery",
                "noise_level": 80.0,
                "event_description": "A brick flies through the bakery window."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_id"], 1);
        assert_eq!(body["affected_agents"], json!(["baker_01", "student_01"]));

        let reactions = body["agent_reactions"].as_array().unwrap();
        assert_eq!(reactions[0]["agent_name"], "Martha Quinn");
        assert_eq!(reactions[0]["adapter_name"], "baker.lora");
        assert_eq!(
            reactions[0]["generated_response"],
            "I don't have time for this nonsense!"
        );
        assert!(reactions[0]["context"]["relevant_memories"].is_array());
    }

    #[tokio::test]
    async fn test_event_requires_type() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/event",
            Some(json!({"event_type": "", "location": "bakery"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_malformed_event_is_rejected() {
        let (app, _dir) = app().await;
        let (status, _) = send(&app, "POST", "/event", Some(json!({"noise_level": "loud"}))).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_dialogue_returns_hex_audio() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/dialogue",
            Some(json!({"npc_id": "baker_01", "player_message": "Is the bread fresh?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["npc_id"], "baker_01");
        assert_eq!(body["emotional_state"], "neutral");
        // "RIFF"
        assert!(body["audio_bytes"].as_str().unwrap().starts_with("52494646"));
    }

    #[tokio::test]
    async fn test_dialogue_accepts_context_object() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/dialogue",
            Some(json!({
                "npc_id": "student_01",
                "player_message": "Can't sleep either?",
                "context": {"time_of_day": "night", "weather": "storm"}
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["npc_id"], "student_01");
        assert!(!body["text_response"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_accepts_null_optionals() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/event",
            Some(json!({
                "event_type": "property_damage",
                "location": "bakery",
                "noise_level": null,
                "instigator_id": null,
                "event_description": "Someone kicks the bakery door."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["event_id"], 1);
    }

    #[tokio::test]
    async fn test_dialogue_unknown_npc_is_404() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/dialogue",
            Some(json!({"npc_id": "ghost", "player_message": "Boo"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_agent_context_and_state_update() {
        let (app, _dir) = app().await;

        let (status, body) = send(
            &app,
            "PUT",
            "/agent/student_01/state",
            Some(json!({"emotional_state": "scared"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["emotional_state"], "scared");
        assert_eq!(body["current_location"], "apartment_1a");

        let (status, body) = send(&app, "GET", "/agent/student_01", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent"]["name"], "Eli Park");
        assert_eq!(body["emotional_state"], "scared");

        let (status, body) = send(&app, "GET", "/agent/nobody", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["agent"].is_null());
        assert_eq!(body["emotional_state"], "neutral");

        let (status, _) = send(
            &app,
            "PUT",
            "/agent/nobody/state",
            Some(json!({"location": "park"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_adapter_preload_and_status() {
        let (app, _dir) = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/adapters/preload",
            Some(json!({"adapters": ["baker.lora", "wizard.lora"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loaded"], json!(["baker.lora"]));
        assert_eq!(body["failed"][0]["name"], "wizard.lora");

        let (status, body) = send(&app, "GET", "/adapters/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loaded_adapters"], json!(["baker.lora"]));
        assert_eq!(body["cache_size"], 1);
        assert_eq!(body["max_cache_size"], 3);
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let (app, _dir) = app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("events_total 0"));
        assert!(text.contains("adapter_cache_misses_total"));
    }
}
