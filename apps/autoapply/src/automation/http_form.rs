//! HTTP form-submission backend.
//!
//! Fetches the posting page, finds the apply control, follows it to the
//! application form, fills contact details, attaches the resume and submits.
//! Pages are parsed synchronously into owned data before the next await.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use super::forms::{choose_form, parse_forms, FormMethod, FormSpec};
use super::locator::{best_match, locate_apply_control, ControlAction};
use super::{ApplyOutcome, AutomationError, AutomationFactory, AutomationSession, Delay, TokioDelay};
use crate::config::{AutomationSettings, UserProfile};
use crate::models::JobPosting;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Builds one cookie-keeping HTTP session per batch.
#[derive(Clone)]
pub struct HttpFormAutomation {
    delay: Arc<dyn Delay>,
}

impl Default for HttpFormAutomation {
    fn default() -> Self {
        Self::new(Arc::new(TokioDelay))
    }
}

impl HttpFormAutomation {
    pub fn new(delay: Arc<dyn Delay>) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AutomationFactory for HttpFormAutomation {
    async fn acquire(
        &self,
        settings: &AutomationSettings,
    ) -> Result<Box<dyn AutomationSession>, AutomationError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AutomationError::Acquire(e.to_string()))?;

        debug!(
            "HTTP automation session started (headless={})",
            settings.headless
        );
        Ok(Box::new(HttpFormSession {
            client: Some(client),
            settings: settings.clone(),
            delay: Arc::clone(&self.delay),
        }))
    }
}

struct Page {
    url: Url,
    status: u16,
    body: String,
}

impl Page {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct HttpFormSession {
    client: Option<Client>,
    settings: AutomationSettings,
    delay: Arc<dyn Delay>,
}

impl HttpFormSession {
    async fn navigate(&self, client: &Client, url: Url) -> Result<Page, AutomationError> {
        let navigation_error = |error: reqwest::Error| AutomationError::Navigation {
            url: url.to_string(),
            error,
        };
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(navigation_error)?;
        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let body = response.text().await.map_err(navigation_error)?;

        self.delay.pause(self.settings.navigation_wait()).await;
        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }

    async fn submit(
        &self,
        client: &Client,
        base: &Url,
        form: &FormSpec,
        resume: Option<(String, Vec<u8>)>,
    ) -> Result<ApplyOutcome, AutomationError> {
        let target = match form.action.as_deref().filter(|a| !a.is_empty()) {
            Some(action) => match base.join(action) {
                Ok(url) => url,
                Err(e) => return Ok(ApplyOutcome::failed(format!("Invalid form action: {e}"))),
            },
            None => base.clone(),
        };

        let pairs = form.text_pairs();
        let request = match form.method {
            FormMethod::Get => client.get(target.clone()).query(&pairs),
            FormMethod::Post if form.multipart => {
                let mut body = Form::new();
                for (name, value) in pairs {
                    body = body.text(name, value);
                }
                if let (Some(field), Some((file_name, bytes))) = (form.file_field(), resume) {
                    let part = Part::bytes(bytes)
                        .file_name(file_name)
                        .mime_str("application/pdf")
                        .map_err(|e| AutomationError::Backend(e.to_string()))?;
                    body = body.part(field.name.clone(), part);
                }
                client.post(target.clone()).multipart(body)
            }
            FormMethod::Post => client.post(target.clone()).form(&pairs),
        };

        let response = request
            .send()
            .await
            .map_err(|error| AutomationError::Navigation {
                url: target.to_string(),
                error,
            })?;
        let status = response.status();
        self.delay.pause(self.settings.navigation_wait()).await;

        if status.is_success() {
            Ok(ApplyOutcome::submitted("Application submitted"))
        } else {
            Ok(ApplyOutcome::failed(format!(
                "Submission rejected with status {}",
                status.as_u16()
            )))
        }
    }
}

async fn read_resume(resume_path: &Path) -> Option<(String, Vec<u8>)> {
    match tokio::fs::read(resume_path).await {
        Ok(bytes) => {
            let file_name = resume_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "resume.pdf".to_string());
            Some((file_name, bytes))
        }
        Err(e) => {
            warn!("Could not read resume {}: {}", resume_path.display(), e);
            None
        }
    }
}

#[async_trait]
impl AutomationSession for HttpFormSession {
    async fn apply_to_job(
        &mut self,
        job: &JobPosting,
        user: &UserProfile,
        resume_path: &Path,
    ) -> Result<ApplyOutcome, AutomationError> {
        let client = self.client.clone().ok_or(AutomationError::SessionClosed)?;

        let start = match Url::parse(job.target_url()) {
            Ok(url) => url,
            Err(e) => return Ok(ApplyOutcome::failed(format!("Invalid job URL: {e}"))),
        };
        let page = self.navigate(&client, start).await?;
        if !page.is_success() {
            return Ok(ApplyOutcome::failed(format!(
                "Job page returned status {}",
                page.status
            )));
        }

        let control = locate_apply_control(&page.body).or_else(|| {
            best_match(&page.body).map(|found| {
                debug!(
                    "Using best-match apply control '{}' (score {:.2})",
                    found.control.label, found.score
                );
                found.control
            })
        });
        let Some(control) = control else {
            return Ok(ApplyOutcome::failed("Apply button not located"));
        };

        let (form_page, preferred) = match control.action {
            ControlAction::Navigate(href) => {
                let next = match page.url.join(&href) {
                    Ok(url) => url,
                    Err(e) => return Ok(ApplyOutcome::failed(format!("Invalid apply link: {e}"))),
                };
                let next_page = self.navigate(&client, next).await?;
                if !next_page.is_success() {
                    return Ok(ApplyOutcome::failed(format!(
                        "Application page returned status {}",
                        next_page.status
                    )));
                }
                (next_page, None)
            }
            ControlAction::Form(index) => (page, Some(index)),
            ControlAction::Reveal => (page, None),
        };

        let mut forms = parse_forms(&form_page.body);
        let Some(index) = choose_form(&forms, preferred) else {
            return Ok(ApplyOutcome::failed("Application form not found"));
        };
        let mut form = forms.swap_remove(index);

        let filled = form.fill_contact_details(user);
        debug!("Filled fields {:?} for {}", filled, job.id);

        let resume = if form.file_field().is_some() {
            read_resume(resume_path).await
        } else {
            None
        };

        if !form.has_submit {
            return Ok(ApplyOutcome::failed("Form not submitted"));
        }

        let outcome = self.submit(&client, &form_page.url, &form, resume).await?;
        info!("{} at {}: {}", job.title, job.company, outcome.message);
        Ok(outcome)
    }

    async fn release(&mut self) -> Result<(), AutomationError> {
        if self.client.take().is_some() {
            debug!("HTTP automation session released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::delay::fakes::RecordingDelay;
    use crate::models::posting::fixtures::posting;
    use chrono::Utc;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user() -> UserProfile {
        UserProfile {
            full_name: "Alex Candidate".to_string(),
            email: "alex@example.com".to_string(),
            phone: Some("+1 555 0100".to_string()),
            location: None,
            skills: vec![],
            links: vec![],
        }
    }

    fn settings() -> AutomationSettings {
        AutomationSettings {
            wait_after_navigation: 1.5,
            ..AutomationSettings::default()
        }
    }

    fn job_at(url: String) -> JobPosting {
        let mut job = posting("job-1", "Acme", 1, Utc::now());
        job.url = url;
        job.apply_url = None;
        job
    }

    fn resume_file() -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        std::fs::write(file.path(), b"%PDF-1.4 resume body").unwrap();
        file
    }

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn session(delay: RecordingDelay) -> Box<dyn AutomationSession> {
        HttpFormAutomation::new(Arc::new(delay))
            .acquire(&settings())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_follows_apply_link_and_submits_multipart() {
        let server = MockServer::start().await;
        serve(&server, "/jobs/1", r#"<a href="/jobs/1/apply">Apply now</a>"#).await;
        serve(
            &server,
            "/jobs/1/apply",
            r#"<form action="/submit" method="post" enctype="multipart/form-data">
                <input type="hidden" name="token" value="abc">
                <input name="full_name"><input name="email"><input name="phone">
                <input type="file" name="resume">
                <button type="submit">Send</button>
            </form>"#,
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let delay = RecordingDelay::default();
        let mut session = session(delay.clone()).await;
        let resume = resume_file();
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/1", server.uri())), &user(), resume.path())
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::submitted("Application submitted"));
        // Two page loads and the submission.
        assert_eq!(delay.recorded(), vec![Duration::from_millis(1500); 3]);

        let requests = server.received_requests().await.unwrap();
        let submitted = requests
            .iter()
            .find(|r| r.method.to_string() == "POST")
            .unwrap();
        let body = String::from_utf8_lossy(&submitted.body);
        assert!(body.contains("Alex Candidate"));
        assert!(body.contains("alex@example.com"));
        assert!(body.contains("abc"));
        assert!(body.contains("%PDF-1.4 resume body"));
    }

    #[tokio::test]
    async fn test_in_page_form_submitted_urlencoded() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/jobs/2",
            r#"<form action="/jobs/2/apply" method="post">
                <input name="email" placeholder="Email">
                <button type="submit">Submit application</button>
            </form>"#,
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/jobs/2/apply"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/2", server.uri())), &user(), Path::new("unused.pdf"))
            .await
            .unwrap();
        assert!(outcome.success);

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[1].body).to_string();
        assert_eq!(body, "email=alex%40example.com");
    }

    #[tokio::test]
    async fn test_missing_apply_control() {
        let server = MockServer::start().await;
        serve(&server, "/jobs/3", r#"<p>Closed</p><a href="/home">Home</a>"#).await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/3", server.uri())), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::failed("Apply button not located"));
    }

    #[tokio::test]
    async fn test_best_match_fallback_and_missing_submit() {
        let server = MockServer::start().await;
        serve(&server, "/jobs/4", r#"<a class="btn-apply" href="/start">Start</a>"#).await;
        serve(&server, "/start", r#"<form><input name="email"></form>"#).await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/4", server.uri())), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::failed("Form not submitted"));
    }

    #[tokio::test]
    async fn test_no_form_after_apply_link() {
        let server = MockServer::start().await;
        serve(&server, "/jobs/5", r#"<a href="/ats">Quick apply</a>"#).await;
        serve(&server, "/ats", "<p>Sign in to continue</p>").await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/5", server.uri())), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::failed("Application form not found"));
    }

    #[tokio::test]
    async fn test_error_status_is_unsuccessful_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/gone", server.uri())), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.message.contains("404"));
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/jobs/6",
            r#"<form action="/send"><input name="full_name"><input type="submit" value="Apply now"></form>"#,
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at(format!("{}/jobs/6", server.uri())), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::failed("Submission rejected with status 422"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_unsuccessful_outcome() {
        let mut session = session(RecordingDelay::default()).await;
        let outcome = session
            .apply_to_job(&job_at("not a url".to_string()), &user(), Path::new("r.pdf"))
            .await
            .unwrap();
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_error() {
        let mut session = session(RecordingDelay::default()).await;
        let err = session
            .apply_to_job(&job_at("http://127.0.0.1:1/job".to_string()), &user(), Path::new("r.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_released_session_rejects_work() {
        let mut session = session(RecordingDelay::default()).await;
        session.release().await.unwrap();
        session.release().await.unwrap();
        let err = session
            .apply_to_job(&job_at("http://localhost/".to_string()), &user(), Path::new("r.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::SessionClosed));
    }
}
