use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use jobctl_api::{ApiError, ApiHandler, HttpApi};
use jobctl_core::{Cancellation, CoreError};
use jobctl_model::{
    JobDescriptor, JobId, JobPage, JobQuery, JobSnapshot, JobState, JobSummary, OutputLine,
};
use serde_json::{Value, json};
use tower::ServiceExt;

#[derive(Default)]
struct Stub {
    closed: bool,
    cancels: Mutex<Vec<(String, bool)>>,
    queries: Mutex<Vec<JobQuery>>,
}

impl Stub {
    fn guard(&self) -> Result<(), ApiError> {
        if self.closed {
            return Err(CoreError::Closed.into());
        }
        Ok(())
    }
}

fn snapshot(id: &str) -> JobSnapshot {
    JobSnapshot {
        id: JobId::from(id),
        descriptor: Arc::new(JobDescriptor::builder("build", "make").build().unwrap()),
        state: JobState::Running,
        submitted_at: SystemTime::now(),
        started_at: Some(SystemTime::now()),
        ended_at: None,
        pid: Some(77),
        output: vec![OutputLine::stdout("compiling")],
        output_truncated: false,
        exit: None,
        failure: None,
        cancel: None,
    }
}

#[async_trait]
impl ApiHandler for Stub {
    async fn submit_job(&self, descriptor: JobDescriptor) -> Result<JobId, ApiError> {
        self.guard()?;
        descriptor.validate().map_err(CoreError::from)?;
        Ok(JobId::from("job-1"))
    }

    async fn cancel_job(&self, id: &JobId, graceful: bool) -> Result<Cancellation, ApiError> {
        self.guard()?;
        if id.as_str() != "job-1" {
            return Err(CoreError::NotFound(id.clone()).into());
        }
        self.cancels
            .lock()
            .unwrap()
            .push((id.to_string(), graceful));
        Ok(Cancellation::Terminating)
    }

    async fn get_job(&self, id: &JobId) -> Result<JobSnapshot, ApiError> {
        self.guard()?;
        match id.as_str() {
            "job-1" => Ok(snapshot("job-1")),
            _ => Err(CoreError::NotFound(id.clone()).into()),
        }
    }

    async fn list_jobs(&self, query: JobQuery) -> Result<JobPage<JobSummary>, ApiError> {
        self.guard()?;
        self.queries.lock().unwrap().push(query);
        Ok(JobPage {
            items: vec![snapshot("job-1").summary()],
            total: 7,
        })
    }

    async fn acknowledge_job(&self, id: &JobId) -> Result<(), ApiError> {
        self.guard()?;
        match id.as_str() {
            "job-1" => Ok(()),
            "active" => Err(CoreError::StillActive(id.clone()).into()),
            _ => Err(CoreError::NotFound(id.clone()).into()),
        }
    }
}

async fn call(stub: &Arc<Stub>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let router = HttpApi::new(Arc::clone(stub)).router();
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let resp = router.oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn submit_returns_created_with_job_id() {
    let stub = Arc::new(Stub::default());
    let (status, body) = call(
        &stub,
        "POST",
        "/api/v1/jobs",
        Some(json!({ "descriptor": { "id": "build", "command": "make", "args": ["all"] } })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "jobId": "job-1" }));
}

#[tokio::test]
async fn invalid_descriptor_is_bad_request() {
    let stub = Arc::new(Stub::default());
    let (status, body) = call(
        &stub,
        "POST",
        "/api/v1/jobs",
        Some(json!({ "descriptor": { "id": "build", "command": "" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("command is empty"));

    let (status, _) = call(&stub, "POST", "/api/v1/jobs", Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_returns_the_snapshot_or_404() {
    let stub = Arc::new(Stub::default());

    let (status, body) = call(&stub, "GET", "/api/v1/jobs/job-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "job-1");
    assert_eq!(body["state"], "running");
    assert_eq!(body["pid"], 77);
    assert_eq!(body["descriptor"]["command"], "make");

    let (status, body) = call(&stub, "GET", "/api/v1/jobs/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "job not found: ghost");
}

#[tokio::test]
async fn list_parses_filters_and_pagination() {
    let stub = Arc::new(Stub::default());
    let (status, body) = call(
        &stub,
        "GET",
        "/api/v1/jobs?state=failed&descriptor=build&offset=5&limit=5000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 7);
    assert_eq!(body["items"][0]["descriptorId"], "build");

    let queries = stub.queries.lock().unwrap();
    let q = &queries[0];
    assert_eq!(q.state, Some(JobState::Failed));
    assert_eq!(q.descriptor_id.as_deref(), Some("build"));
    assert_eq!(q.offset, 5);
    assert_eq!(q.limit, 1000);
}

#[tokio::test]
async fn list_rejects_unknown_state() {
    let stub = Arc::new(Stub::default());
    let (status, body) = call(&stub, "GET", "/api/v1/jobs?state=sleeping", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sleeping"));
    assert!(stub.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_defaults_to_graceful() {
    let stub = Arc::new(Stub::default());

    let (status, body) = call(&stub, "POST", "/api/v1/jobs/job-1/cancel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "terminating" }));

    let (status, _) = call(
        &stub,
        "POST",
        "/api/v1/jobs/job-1/cancel",
        Some(json!({ "graceful": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        *stub.cancels.lock().unwrap(),
        [("job-1".to_string(), true), ("job-1".to_string(), false)]
    );

    let (status, _) = call(&stub, "POST", "/api/v1/jobs/ghost/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn acknowledge_maps_conflicts() {
    let stub = Arc::new(Stub::default());

    let (status, _) = call(&stub, "DELETE", "/api/v1/jobs/job-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&stub, "DELETE", "/api/v1/jobs/active", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&stub, "DELETE", "/api/v1/jobs/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closed_orchestrator_is_unavailable() {
    let stub = Arc::new(Stub {
        closed: true,
        ..Stub::default()
    });
    let (status, _) = call(&stub, "GET", "/api/v1/jobs", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
