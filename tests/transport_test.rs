//! Integration tests for the HTTP transport against a local stub endpoint

#[cfg(feature = "http")]
mod transport_tests {
    use axum::{extract::State, http::StatusCode, routing::put, Json, Router};
    use chrono::{Duration as ChronoDuration, NaiveDateTime, TimeZone, Utc};
    use motion_window_collector::{
        collector::{ScriptedSensor, StreamKind},
        session::{CollectionSession, SessionSettings},
        upload::{
            HttpTransport, RequestTemplate, Transport, TransportError, UploadError, UploadRequest,
            WIRE_TIMESTAMP_FORMAT,
        },
    };
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn save_json(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
        captured.lock().unwrap().push(body);
        Json(serde_json::json!({ "result": "saved" }))
    }

    async fn broken() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable")
    }

    /// Start the stub endpoint on a random port.
    async fn spawn_stub() -> (SocketAddr, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/api/collision-data/save-json", put(save_json))
            .route("/broken", put(broken))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub endpoint");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, captured)
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).expect("Failed to create transport")
    }

    #[tokio::test]
    async fn test_put_sends_wire_shape() {
        let (addr, captured) = spawn_stub().await;
        let request = UploadRequest {
            situation: "parking lot".to_string(),
            is_collision: true,
            platform: "android".to_string(),
            samples: Vec::new(),
        };

        let response = transport()
            .put(
                &format!("http://{addr}/api/collision-data/save-json"),
                &request,
            )
            .await
            .expect("Upload failed");

        assert_eq!(response.status, 200);
        assert!(response.body.contains("saved"));

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["situation"], "parking lot");
        assert_eq!(bodies[0]["isCollision"], true);
        assert_eq!(bodies[0]["platform"], "android");
        assert!(bodies[0]["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_server_error() {
        let (addr, _) = spawn_stub().await;
        let request = UploadRequest {
            situation: "test".to_string(),
            is_collision: false,
            platform: "android".to_string(),
            samples: Vec::new(),
        };

        let result = transport()
            .put(&format!("http://{addr}/broken"), &request)
            .await;

        match result {
            Err(TransportError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("Expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_uploads_full_window_once() {
        let (addr, captured) = spawn_stub().await;
        let sensor = Arc::new(ScriptedSensor::new());
        let settings = SessionSettings {
            endpoint: format!("http://{addr}/api/collision-data/save-json"),
            template: RequestTemplate {
                timezone: chrono_tz::Asia::Seoul,
                ..RequestTemplate::default()
            },
            ..SessionSettings::default()
        };
        let session = CollectionSession::new(sensor.clone(), transport(), settings);

        session.start().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap();
        for i in 0..100 {
            let at = base + ChronoDuration::milliseconds(i * 100);
            sensor.emit(StreamKind::Gyroscope, [0.1, 0.2, 0.3], at);
            sensor.emit(StreamKind::Accelerometer, [1.0, 2.0, 9.8], at);
        }

        let response = session.submit(false).await.expect("Upload failed");
        assert_eq!(response.status, 200);
        assert_eq!(
            session.submit(false).await,
            Err(UploadError::AlreadyUploaded)
        );

        let bodies = captured.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["isCollision"], false);

        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 100);

        // 03:00 UTC is noon in Seoul
        assert_eq!(data[0]["timestamp"], "2024-03-01 12:00:00");
        for entry in data {
            let timestamp = entry["timestamp"].as_str().unwrap();
            assert!(NaiveDateTime::parse_from_str(timestamp, WIRE_TIMESTAMP_FORMAT).is_ok());
            assert_eq!(entry["gyro"].as_array().unwrap().len(), 3);
            assert_eq!(entry["accel"].as_array().unwrap().len(), 3);
        }
        // The first sample was taken before any accelerometer reading arrived
        assert_eq!(data[0]["accel"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(data[1]["accel"][2].as_f64().unwrap() as f32, 9.8_f32);
    }
}
