//! Named configuration commands.
//!
//! A host that drives the front-end by name (`"set-port"`, `"add-static"`,
//! ...) parses each request into a [`Command`] and hands it to
//! [`FrontEnd::execute`]. Arguments arrive as JSON and are type-checked
//! here; semantic checks stay with the gate and the registrations.

use std::fmt;

use serde_json::Value;

use crate::config::{BodyParserMode, RedirectConfig, StaticConfig};
use crate::error::{FrontendError, Result};
use crate::http::server::FrontEnd;
use crate::redirect::RedirectSpec;
use crate::routing::DynamicHandler;

/// Every command name the front-end answers to.
pub const COMMAND_NAMES: [&str; 11] = [
    "add-static",
    "add-dynamic",
    "set-port",
    "get-port",
    "set-domain",
    "get-domain",
    "set-https",
    "get-protocol",
    "set-redirect",
    "set-body-parser",
    "set-enable-session",
];

pub enum Command {
    SetPort(u16),
    GetPort,
    SetDomain(String),
    GetDomain,
    SetHttps(bool),
    GetProtocol,
    SetRedirect(RedirectConfig),
    SetBodyParser(BodyParserMode),
    SetEnableSession(bool),
    AddStatic(StaticConfig),
    /// Only constructible in code: a handler has no JSON form.
    AddDynamic {
        path: String,
        method: String,
        handler: DynamicHandler,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetPort(port) => f.debug_tuple("SetPort").field(port).finish(),
            Command::GetPort => f.write_str("GetPort"),
            Command::SetDomain(domain) => f.debug_tuple("SetDomain").field(domain).finish(),
            Command::GetDomain => f.write_str("GetDomain"),
            Command::SetHttps(enabled) => f.debug_tuple("SetHttps").field(enabled).finish(),
            Command::GetProtocol => f.write_str("GetProtocol"),
            Command::SetRedirect(rule) => f.debug_tuple("SetRedirect").field(rule).finish(),
            Command::SetBodyParser(mode) => f.debug_tuple("SetBodyParser").field(mode).finish(),
            Command::SetEnableSession(enabled) => {
                f.debug_tuple("SetEnableSession").field(enabled).finish()
            }
            Command::AddStatic(mount) => f.debug_tuple("AddStatic").field(mount).finish(),
            Command::AddDynamic { path, method, .. } => f
                .debug_struct("AddDynamic")
                .field("path", path)
                .field("method", method)
                .finish_non_exhaustive(),
        }
    }
}

/// What a command returns: getters yield a value, setters nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    None,
    Port(Option<u16>),
    Domain(Option<String>),
    Protocol(&'static str),
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(field: &'static str, want: &str, got: &Value) -> FrontendError {
    FrontendError::validation(field, format!("expected {want}, got {}", type_name(got)))
}

/// Loose truthiness, so `set-https` accepts `1`, `"yes"` and the like.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn object<T: serde::de::DeserializeOwned>(field: &'static str, arg: Value) -> Result<T> {
    if !arg.is_object() {
        return Err(expected(field, "object", &arg));
    }
    serde_json::from_value(arg).map_err(|e| FrontendError::validation(field, e.to_string()))
}

impl Command {
    /// Parse a named command and its JSON argument.
    pub fn parse(name: &str, arg: Value) -> Result<Self> {
        match name {
            "set-port" => {
                let port = match &arg {
                    Value::Number(n) => n.as_u64().ok_or_else(|| {
                        FrontendError::validation(
                            "port",
                            format!("expected a non-negative integer, got {n}"),
                        )
                    })?,
                    other => return Err(expected("port", "number", other)),
                };
                let port = u16::try_from(port)
                    .map_err(|_| FrontendError::validation("port", "must be between 1 and 65535"))?;
                Ok(Command::SetPort(port))
            }
            "get-port" => Ok(Command::GetPort),
            "set-domain" => match arg {
                Value::String(domain) => Ok(Command::SetDomain(domain)),
                other => Err(expected("domain", "string", &other)),
            },
            "get-domain" => Ok(Command::GetDomain),
            "set-https" => Ok(Command::SetHttps(truthy(&arg))),
            "get-protocol" => Ok(Command::GetProtocol),
            "set-redirect" => Ok(Command::SetRedirect(object("redirect", arg)?)),
            "set-body-parser" => match arg {
                Value::String(mode) => Ok(Command::SetBodyParser(mode.parse()?)),
                other => Err(expected("body_parser", "string", &other)),
            },
            "set-enable-session" => match arg {
                Value::Bool(enabled) => Ok(Command::SetEnableSession(enabled)),
                other => Err(expected("enabled", "boolean", &other)),
            },
            "add-static" => Ok(Command::AddStatic(object("static", arg)?)),
            "add-dynamic" => Err(FrontendError::validation(
                "handler",
                "add-dynamic needs a handler; build Command::AddDynamic directly",
            )),
            other => Err(FrontendError::validation(
                "command",
                format!("unknown command: {other}"),
            )),
        }
    }

    /// The command's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetPort(_) => "set-port",
            Command::GetPort => "get-port",
            Command::SetDomain(_) => "set-domain",
            Command::GetDomain => "get-domain",
            Command::SetHttps(_) => "set-https",
            Command::GetProtocol => "get-protocol",
            Command::SetRedirect(_) => "set-redirect",
            Command::SetBodyParser(_) => "set-body-parser",
            Command::SetEnableSession(_) => "set-enable-session",
            Command::AddStatic(_) => "add-static",
            Command::AddDynamic { .. } => "add-dynamic",
        }
    }
}

impl FrontEnd {
    /// Run one configuration command.
    pub fn execute(&self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::SetPort(port) => self.set_port(port).map(|_| CommandOutput::None),
            Command::GetPort => Ok(CommandOutput::Port(self.port())),
            Command::SetDomain(domain) => self.set_domain(domain).map(|_| CommandOutput::None),
            Command::GetDomain => Ok(CommandOutput::Domain(self.domain())),
            Command::SetHttps(enabled) => self.set_https(enabled).map(|_| CommandOutput::None),
            Command::GetProtocol => Ok(CommandOutput::Protocol(self.protocol())),
            Command::SetRedirect(rule) => self
                .set_redirect(RedirectSpec::from(rule))
                .map(|_| CommandOutput::None),
            Command::SetBodyParser(mode) => self.set_body_parser(mode).map(|_| CommandOutput::None),
            Command::SetEnableSession(enabled) => {
                self.set_enable_session(enabled).map(|_| CommandOutput::None)
            }
            Command::AddStatic(mount) => self
                .add_static(&mount.path, mount.dir)
                .map(|_| CommandOutput::None),
            Command::AddDynamic {
                path,
                method,
                handler,
            } => self
                .add_dynamic(&path, &method, handler)
                .map(|_| CommandOutput::None),
        }
    }

    /// Parse and run a named command.
    pub fn configure(&self, name: &str, arg: Value) -> Result<CommandOutput> {
        self.execute(Command::parse(name, arg)?)
    }
}
