//! JSON rendering.

use nt_backtrace::Frame;
use nt_config::NotifierIdentity;
use nt_redact::ParamsBag;
use serde::Serialize;

use crate::error::SerializationError;
use crate::notice::Notice;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonNotice<'a> {
    api_key: Option<&'a str>,
    notifier: &'a NotifierIdentity,
    error: JsonError<'a>,
    backtrace: Vec<JsonFrame<'a>>,
    request: JsonRequest<'a>,
    server_environment: JsonServerEnvironment<'a>,
    current_user: &'a ParamsBag,
}

#[derive(Serialize)]
struct JsonError<'a> {
    class: Option<&'a str>,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonFrame<'a> {
    file: &'a str,
    line: Option<u32>,
    method: &'a str,
}

impl<'a> From<&'a Frame> for JsonFrame<'a> {
    fn from(frame: &'a Frame) -> Self {
        Self {
            file: frame.wire_file(),
            line: frame.line,
            method: frame.wire_method(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRequest<'a> {
    url: Option<&'a str>,
    component: Option<&'a str>,
    action: Option<&'a str>,
    params: &'a ParamsBag,
    cgi_data: &'a ParamsBag,
    session_data: &'a ParamsBag,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonServerEnvironment<'a> {
    project_root: Option<&'a str>,
    environment_name: &'a str,
    hostname: Option<&'a str>,
}

/// Render a notice as a JSON object.
pub fn render_json(notice: &Notice) -> Result<String, SerializationError> {
    let doc = JsonNotice {
        api_key: notice.api_key(),
        notifier: notice.notifier(),
        error: JsonError {
            class: notice.error_class(),
            message: notice.error_message(),
        },
        backtrace: notice.backtrace().iter().map(JsonFrame::from).collect(),
        request: JsonRequest {
            url: notice.url(),
            component: notice.component(),
            action: notice.action(),
            params: notice.parameters(),
            cgi_data: notice.cgi_data(),
            session_data: notice.session_data(),
        },
        server_environment: JsonServerEnvironment {
            project_root: notice.project_root(),
            environment_name: notice.environment_name(),
            hostname: notice.hostname(),
        },
        current_user: notice.current_user(),
    };

    Ok(serde_json::to_string(&doc)?)
}
