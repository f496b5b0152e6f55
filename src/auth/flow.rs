// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Onboarding login state machine
//!
//! Start, JS challenge, username, password. Every step POSTs to the
//! onboarding task endpoint with the flow token the previous response
//! returned and the cookies collected so far.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Error, LoginStage, Result, StageContext};
use crate::http::{headers, Cookie, CookieJar, HttpClient, Request, Response};

use super::challenge::ChallengeSolver;
use super::scrape::Bootstrap;

/// Subtask id of the JS instrumentation challenge
pub const JS_INSTRUMENTATION: &str = "LoginJsInstrumentationSubtask";
/// Subtask id of the username prompt
pub const ENTER_USER_IDENTIFIER: &str = "LoginEnterUserIdentifierSSO";
/// Subtask id of the password prompt
pub const ENTER_PASSWORD: &str = "LoginEnterPassword";

/// Subtasks this client has no way to complete
const UNSUPPORTED_SUBTASKS: &[&str] = &[
    "LoginTwoFactorAuthChallenge",
    "LoginAcid",
    "LoginEnterAlternateIdentifierSubtask",
    "DenyLoginSubtask",
    "ArkoseLogin",
];

/// Cookies harvested from the start response, in replay order
const GUEST_COOKIES: &[&str] = &["att", "guest_id", "__cf_bm"];

const NEXT_LINK: &str = "next_link";

/// Where a login flow is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Init,
    Started,
    ChallengeSolved,
    UsernameSubmitted,
    PasswordSubmitted,
    Complete,
    /// A step failed; the flow cannot continue
    Failed(LoginStage),
}

/// Onboarding task response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub flow_token: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// One pending subtask
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Subtask {
    pub subtask_id: String,
    #[serde(default)]
    pub js_instrumentation: Option<JsInstrumentation>,
}

/// Payload of the JS instrumentation subtask
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsInstrumentation {
    pub url: String,
    #[serde(default)]
    pub timeout_ms: u64,
}

#[derive(Serialize)]
struct TaskRequest<'a> {
    flow_token: &'a str,
    subtask_inputs: Vec<SubtaskInput<'a>>,
}

#[derive(Serialize)]
struct SubtaskInput<'a> {
    subtask_id: &'a str,
    #[serde(flatten)]
    input: StepInput<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum StepInput<'a> {
    JsInstrumentation {
        response: &'a str,
        link: &'a str,
    },
    SettingsList {
        setting_responses: Vec<SettingResponse<'a>>,
        link: &'a str,
    },
    EnterPassword {
        password: &'a str,
        link: &'a str,
    },
}

#[derive(Serialize)]
struct SettingResponse<'a> {
    key: &'a str,
    response_data: ResponseData<'a>,
}

#[derive(Serialize)]
struct ResponseData<'a> {
    text_data: TextData<'a>,
}

#[derive(Serialize)]
struct TextData<'a> {
    result: &'a str,
}

/// Raw `Set-Cookie` lines issued by the password step
///
/// Either line is empty when the Service did not send that cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    /// Full `ct0` line
    pub csrf_raw: String,
    /// Full `auth_token` line
    pub auth_raw: String,
}

impl SessionCookies {
    /// The Service logged the session out right after issuing it
    pub fn logged_out(&self) -> bool {
        self.csrf_raw.is_empty()
    }
}

/// One login attempt
///
/// Owned by the caller that started it and dropped when the attempt ends.
pub struct LoginFlow {
    http: HttpClient,
    solver: ChallengeSolver,
    endpoint: String,
    user_agent: String,
    anonymous_bearer: String,
    guest_token: String,
    cookies: CookieJar,
    flow_token: String,
    subtasks: Vec<Subtask>,
    state: FlowState,
}

impl LoginFlow {
    /// Create a flow against `endpoint` with freshly scraped tokens
    pub fn new(
        http: HttpClient,
        solver: ChallengeSolver,
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
        bootstrap: Bootstrap,
    ) -> Self {
        let mut cookies = CookieJar::new();
        cookies.set("gt", bootstrap.guest_token.clone());

        Self {
            http,
            solver,
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            anonymous_bearer: bootstrap.anonymous_bearer,
            guest_token: bootstrap.guest_token,
            cookies,
            flow_token: String::new(),
            subtasks: Vec::new(),
            state: FlowState::Init,
        }
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Current flow token
    pub fn flow_token(&self) -> &str {
        &self.flow_token
    }

    /// Subtasks the last response listed
    pub fn subtasks(&self) -> &[Subtask] {
        &self.subtasks
    }

    /// Cookies collected so far
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Run every step and return the session cookie lines
    pub async fn run(&mut self, username: &str, password: &str) -> Result<SessionCookies> {
        self.start().await?;
        self.submit_challenge().await?;
        self.submit_username(username).await?;
        self.submit_password(password).await
    }

    /// Open the flow and collect the guest cookies
    pub async fn start(&mut self) -> Result<()> {
        self.expect_state(FlowState::Init, LoginStage::Start)?;

        let body = json!({
            "input_flow_data": {
                "flow_context": {
                    "debug_overrides": {},
                    "start_location": { "location": "manual_link" }
                }
            }
        });
        let request = self
            .envelope(LoginStage::Start)?
            .query(&[("flow_name", "login")])
            .json(&body)?;
        let response = self.send(LoginStage::Start, request).await?;

        for line in response.set_cookies() {
            let name = Cookie::name_of(line);
            if !GUEST_COOKIES.contains(&name) {
                continue;
            }
            let value = Cookie::value_of(line);
            if name == "guest_id" {
                self.cookies.set("guest_id_ads", value);
                self.cookies.set("guest_id_marketing", value);
            }
            self.cookies.set(name, value);
        }

        self.advance(LoginStage::Start, &response)?;
        self.state = FlowState::Started;
        info!(
            cookies = ?self.cookies.names().collect::<Vec<_>>(),
            subtasks = self.subtasks.len(),
            "login flow started"
        );
        Ok(())
    }

    /// Solve the JS instrumentation subtask and submit its payload
    pub async fn submit_challenge(&mut self) -> Result<()> {
        self.expect_state(FlowState::Started, LoginStage::Challenge)?;

        let script_url = match self
            .subtasks
            .iter()
            .find_map(|s| s.js_instrumentation.as_ref())
        {
            Some(js) => js.url.clone(),
            None => {
                self.state = FlowState::Failed(LoginStage::Challenge);
                return Err(Error::login(
                    LoginStage::Challenge,
                    "no JS instrumentation subtask in start response",
                ));
            }
        };

        let payload = match self.solver.solve(&script_url).await {
            Ok(payload) => payload,
            Err(e) => {
                self.state = FlowState::Failed(LoginStage::Challenge);
                return Err(e);
            }
        };

        let flow_token = self.flow_token.clone();
        let body = TaskRequest {
            flow_token: &flow_token,
            subtask_inputs: vec![SubtaskInput {
                subtask_id: JS_INSTRUMENTATION,
                input: StepInput::JsInstrumentation {
                    response: &payload,
                    link: NEXT_LINK,
                },
            }],
        };
        self.submit(LoginStage::Challenge, &body).await?;
        self.state = FlowState::ChallengeSolved;
        info!("js instrumentation submitted");
        Ok(())
    }

    /// Submit the username
    pub async fn submit_username(&mut self, username: &str) -> Result<()> {
        self.expect_state(FlowState::ChallengeSolved, LoginStage::Username)?;

        let flow_token = self.flow_token.clone();
        let body = TaskRequest {
            flow_token: &flow_token,
            subtask_inputs: vec![SubtaskInput {
                subtask_id: ENTER_USER_IDENTIFIER,
                input: StepInput::SettingsList {
                    setting_responses: vec![SettingResponse {
                        key: "user_identifier",
                        response_data: ResponseData {
                            text_data: TextData { result: username },
                        },
                    }],
                    link: NEXT_LINK,
                },
            }],
        };
        self.submit(LoginStage::Username, &body).await?;
        self.state = FlowState::UsernameSubmitted;
        info!(username = %username, "username submitted");
        Ok(())
    }

    /// Submit the password and pick up the session cookie lines
    pub async fn submit_password(&mut self, password: &str) -> Result<SessionCookies> {
        self.expect_state(FlowState::UsernameSubmitted, LoginStage::Password)?;

        let flow_token = self.flow_token.clone();
        let body = TaskRequest {
            flow_token: &flow_token,
            subtask_inputs: vec![SubtaskInput {
                subtask_id: ENTER_PASSWORD,
                input: StepInput::EnterPassword {
                    password,
                    link: NEXT_LINK,
                },
            }],
        };
        let request = self.envelope(LoginStage::Password)?.json(&body)?;
        let response = self.send(LoginStage::Password, request).await?;
        self.finish(&response)?;
        self.state = FlowState::PasswordSubmitted;

        let mut session = SessionCookies::default();
        for line in response.set_cookies() {
            match Cookie::name_of(line) {
                "ct0" => session.csrf_raw = line.to_string(),
                "auth_token" => session.auth_raw = line.to_string(),
                _ => {}
            }
        }

        if session.logged_out() {
            warn!("password accepted but no ct0 cookie issued");
        } else {
            self.state = FlowState::Complete;
            info!(
                auth_token = !session.auth_raw.is_empty(),
                "password submitted, session cookies issued"
            );
        }
        Ok(session)
    }

    fn expect_state(&self, expected: FlowState, stage: LoginStage) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::login(
                stage,
                format!("step out of order: flow is {:?}", self.state),
            ))
        }
    }

    /// Headers shared by every onboarding POST
    fn envelope(&self, stage: LoginStage) -> Result<Request> {
        let mut request = Request::post(&self.endpoint)?
            .header(headers::AUTHORIZATION, &self.anonymous_bearer)?
            .header(headers::USER_AGENT, &self.user_agent)?
            .header(headers::X_TWITTER_ACTIVE_USER, "yes")?
            .header(headers::X_TWITTER_CLIENT_LANGUAGE, "en")?
            .header(headers::X_GUEST_TOKEN, &self.guest_token)?;
        if !self.cookies.is_empty() {
            request = request.header(headers::COOKIE, self.cookies.header())?;
        }
        debug!(stage = %stage, cookies = self.cookies.len(), "onboarding request prepared");
        Ok(request)
    }

    async fn submit<T: Serialize>(&mut self, stage: LoginStage, body: &T) -> Result<Response> {
        let request = self.envelope(stage)?.json(body)?;
        let response = self.send(stage, request).await?;
        self.advance(stage, &response)?;
        Ok(response)
    }

    async fn send(&mut self, stage: LoginStage, request: Request) -> Result<Response> {
        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = FlowState::Failed(stage);
                return Err(e);
            }
        };

        if !response.is_ok() {
            self.state = FlowState::Failed(stage);
            warn!(stage = %stage, status = response.status_code(), "onboarding step rejected");
            return Err(Error::login_rejected(
                stage,
                response.status_code(),
                response.text_lossy(),
            ));
        }
        Ok(response)
    }

    /// Take the new flow token and subtasks from a step response
    fn advance(&mut self, stage: LoginStage, response: &Response) -> Result<()> {
        let task: TaskResponse = match response.json().at_stage(stage) {
            Ok(task) => task,
            Err(e) => {
                self.state = FlowState::Failed(stage);
                return Err(e);
            }
        };

        if task.flow_token.is_empty() {
            self.state = FlowState::Failed(stage);
            return Err(Error::login(stage, "response carried no flow_token"));
        }

        self.reject_unsupported(stage, &task)?;

        debug!(
            stage = %stage,
            status = %task.status,
            subtasks = ?task.subtasks.iter().map(|s| s.subtask_id.as_str()).collect::<Vec<_>>(),
            "flow advanced"
        );
        self.flow_token = task.flow_token;
        self.subtasks = task.subtasks;
        Ok(())
    }

    /// The password step ends the flow, so its body is only checked for
    /// subtasks we cannot answer. The session lives in its cookies.
    fn finish(&mut self, response: &Response) -> Result<()> {
        match response.json::<TaskResponse>() {
            Ok(task) => {
                self.reject_unsupported(LoginStage::Password, &task)?;
                debug!(
                    status = %task.status,
                    flow_token = !task.flow_token.is_empty(),
                    "password step answered"
                );
                self.flow_token = task.flow_token;
                self.subtasks = task.subtasks;
            }
            Err(e) => debug!(error = %e, "password step body not a task response"),
        }
        Ok(())
    }

    fn reject_unsupported(&mut self, stage: LoginStage, task: &TaskResponse) -> Result<()> {
        match task
            .subtasks
            .iter()
            .find(|s| UNSUPPORTED_SUBTASKS.contains(&s.subtask_id.as_str()))
        {
            Some(blocked) => {
                self.state = FlowState::Failed(stage);
                Err(Error::login(
                    stage,
                    format!("Service requested unsupported subtask {}", blocked.subtask_id),
                ))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::ScriptHost;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAYLOAD: &str = r#"{"rf":{"a":1},"s":"fp"}"#;

    struct FixedHost;

    #[async_trait]
    impl ScriptHost for FixedHost {
        async fn evaluate(&self, _script: &str, _ua: &str, _timeout: Duration) -> Result<String> {
            Ok(PAYLOAD.to_string())
        }
    }

    fn task(token: &str, subtasks: Value) -> Value {
        json!({ "flow_token": token, "status": "success", "subtasks": subtasks })
    }

    async fn mount_start(server: &MockServer) {
        let start = task(
            "A",
            json!([{
                "subtask_id": JS_INSTRUMENTATION,
                "js_instrumentation": {
                    "url": format!("{}/js_inst", server.uri()),
                    "timeout_ms": 2000
                }
            }]),
        );
        Mock::given(method("POST"))
            .and(path("/1.1/onboarding/task.json"))
            .and(query_param("flow_name", "login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "att=ATT; Max-Age=1800; Path=/; Secure")
                    .append_header("set-cookie", "guest_id=v1%3A1; Max-Age=34190000; Domain=x.com")
                    .append_header("set-cookie", "__cf_bm=CF; path=/; HttpOnly")
                    .append_header("set-cookie", "personalization_id=P; Max-Age=34190000")
                    .set_body_json(start),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/js_inst"))
            .respond_with(ResponseTemplate::new(200).set_body_string("void 0;"))
            .mount(server)
            .await;
    }

    fn flow(server: &MockServer) -> LoginFlow {
        let http = HttpClient::new().unwrap();
        let solver = ChallengeSolver::new(
            http.clone(),
            Arc::new(FixedHost),
            "test-agent",
            Duration::from_secs(10),
            Duration::from_secs(30),
        );
        LoginFlow::new(
            http,
            solver,
            format!("{}/1.1/onboarding/task.json", server.uri()),
            "test-agent",
            Bootstrap {
                anonymous_bearer: "Bearer AAAA".to_string(),
                guest_token: "42".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_flow_tokens_chain() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "B" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("C", json!([]))))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "C" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "ct0=C; Max-Age=21600; Path=/")
                    .append_header("set-cookie", "auth_token=T; Path=/; HttpOnly")
                    .set_body_json(task("D", json!([]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        let session = flow.run("alice", "pw").await.unwrap();

        assert_eq!(flow.state(), FlowState::Complete);
        assert_eq!(flow.flow_token(), "D");
        assert_eq!(session.csrf_raw, "ct0=C; Max-Age=21600; Path=/");
        assert_eq!(session.auth_raw, "auth_token=T; Path=/; HttpOnly");
    }

    #[tokio::test]
    async fn test_password_step_without_flow_token() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "B" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("C", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "C" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "ct0=C; Max-Age=21600; Path=/")
                    .append_header("set-cookie", "auth_token=T; Path=/; HttpOnly")
                    .set_body_json(json!({ "status": "success", "subtasks": [] })),
            )
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        let session = flow.run("alice", "pw").await.unwrap();

        assert_eq!(flow.state(), FlowState::Complete);
        assert_eq!(session.csrf_raw, "ct0=C; Max-Age=21600; Path=/");
        assert_eq!(session.auth_raw, "auth_token=T; Path=/; HttpOnly");
    }

    #[tokio::test]
    async fn test_password_step_with_opaque_body() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "B" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("C", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "C" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "ct0=C; Path=/")
                    .set_body_string("ok"),
            )
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        let session = flow.run("alice", "pw").await.unwrap();

        assert_eq!(flow.state(), FlowState::Complete);
        assert_eq!(session.csrf_raw, "ct0=C; Path=/");
        assert!(session.auth_raw.is_empty());
    }

    #[tokio::test]
    async fn test_step_bodies() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "B" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("C", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "C" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("D", json!([]))))
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        flow.run("alice", "pw").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let bodies: Vec<Value> = requests
            .iter()
            .filter(|r| r.method.as_str() == "POST")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies.len(), 4);

        assert_eq!(
            bodies[0],
            json!({"input_flow_data":{"flow_context":{"debug_overrides":{},"start_location":{"location":"manual_link"}}}})
        );
        assert_eq!(
            bodies[1],
            json!({"flow_token":"A","subtask_inputs":[{"subtask_id":"LoginJsInstrumentationSubtask","js_instrumentation":{"response":PAYLOAD,"link":"next_link"}}]})
        );
        assert_eq!(
            bodies[2],
            json!({"flow_token":"B","subtask_inputs":[{"subtask_id":"LoginEnterUserIdentifierSSO","settings_list":{"setting_responses":[{"key":"user_identifier","response_data":{"text_data":{"result":"alice"}}}],"link":"next_link"}}]})
        );
        assert_eq!(
            bodies[3],
            json!({"flow_token":"C","subtask_inputs":[{"subtask_id":"LoginEnterPassword","enter_password":{"password":"pw","link":"next_link"}}]})
        );
    }

    #[tokio::test]
    async fn test_cookie_accumulation() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .and(header(
                "cookie",
                "gt=42; att=ATT; guest_id_ads=v1%3A1; guest_id_marketing=v1%3A1; guest_id=v1%3A1; __cf_bm=CF",
            ))
            .and(header("authorization", "Bearer AAAA"))
            .and(header("x-guest-token", "42"))
            .and(header("x-twitter-active-user", "yes"))
            .and(header("x-twitter-client-language", "en"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .expect(1)
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        flow.start().await.unwrap();
        assert!(!flow.cookies().contains("personalization_id"));
        flow.submit_challenge().await.unwrap();
        assert_eq!(flow.state(), FlowState::ChallengeSolved);
    }

    #[tokio::test]
    async fn test_rejected_step_carries_status_and_body() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task("B", json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "B" })))
            .respond_with(
                ResponseTemplate::new(403).set_body_string(r#"{"errors":[{"code":399}]}"#),
            )
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        let err = flow.run("alice", "pw").await.unwrap_err();

        assert_eq!(err.stage(), Some(LoginStage::Username));
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.body(), Some(r#"{"errors":[{"code":399}]}"#));
        assert_eq!(flow.state(), FlowState::Failed(LoginStage::Username));
    }

    #[tokio::test]
    async fn test_unsupported_subtask() {
        let server = MockServer::start().await;
        mount_start(&server).await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "flow_token": "A" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task(
                "B",
                json!([{ "subtask_id": "LoginTwoFactorAuthChallenge" }]),
            )))
            .mount(&server)
            .await;

        let mut flow = flow(&server);
        flow.start().await.unwrap();
        let err = flow.submit_challenge().await.unwrap_err();

        assert_eq!(err.stage(), Some(LoginStage::Challenge));
        assert!(err.to_string().contains("LoginTwoFactorAuthChallenge"));
    }

    #[tokio::test]
    async fn test_steps_out_of_order() {
        let server = MockServer::start().await;
        let mut flow = flow(&server);

        let err = flow.submit_password("pw").await.unwrap_err();
        assert_eq!(err.stage(), Some(LoginStage::Password));
        assert_eq!(flow.state(), FlowState::Init);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_task_response_decoding() {
        let task: TaskResponse = serde_json::from_value(json!({
            "flow_token": "g;1:2",
            "status": "success",
            "subtasks": [{
                "subtask_id": JS_INSTRUMENTATION,
                "js_instrumentation": {
                    "url": "https://twitter.com/i/js_inst?c_name=ui_metrics",
                    "timeout_ms": 2000,
                    "next_link": { "link_type": "task", "link_id": "next_link" }
                }
            }]
        }))
        .unwrap();

        assert_eq!(task.flow_token, "g;1:2");
        let js = task.subtasks[0].js_instrumentation.as_ref().unwrap();
        assert_eq!(js.timeout_ms, 2000);
        assert!(js.url.ends_with("c_name=ui_metrics"));
    }
}
