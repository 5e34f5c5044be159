//! Connection establishment and single-shot query execution.
//!
//! [`Client`] owns the framed TCP stream for one session. It performs the
//! startup handshake, runs one query at a time (Simple protocol for
//! text-format results, Extended protocol for binary), and collects each
//! response stream into an [`ExecOutcome`] once the server reports
//! ReadyForQuery.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::client::error::ClientError;
use crate::client::result::ResultSet;
use crate::protocol::{
    AuthenticationRequest, BackendMessage, ClientCodec, DescribeTarget, ErrorInfo,
    FieldDescription, FormatCode, FrontendMessage, StartupParameters,
};

/// Connection attributes for one session.
///
/// These are explicit values handed to [`Client::connect`] by the caller;
/// the client layer embeds no defaults or credentials of its own.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub application_name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

/// Outcome of one executed statement.
///
/// Transport failures are *not* represented here; they surface as
/// [`ClientError`] and end the session. Everything below leaves the session
/// usable for the next statement.
#[derive(Debug)]
pub enum ExecOutcome {
    /// The statement returned rows (possibly zero of them).
    Rows(ResultSet),
    /// The statement completed without producing a row description
    /// (e.g. an UPDATE where a SELECT was expected).
    Command { tag: String },
    /// The server rejected or failed the statement; carries the server's
    /// diagnostic fields verbatim.
    ServerError(ErrorInfo),
}

/// A live session with a PostgreSQL server.
///
/// One outstanding request at a time: every query runs to ReadyForQuery
/// before the next one is issued. Dropping the client closes the socket;
/// [`close`](Self::close) additionally says goodbye with a Terminate
/// message first.
pub struct Client {
    framed: Framed<TcpStream, ClientCodec>,
    server_params: HashMap<String, String>,
    backend_pid: i32,
    backend_secret_key: i32,
}

impl Client {
    /// Connects and runs the startup handshake to completion.
    ///
    /// Handles AuthenticationOk and AuthenticationCleartextPassword
    /// (answered with the configured password); any other requested method
    /// fails with [`ClientError::UnsupportedAuth`]. An ErrorResponse during
    /// startup becomes [`ClientError::Rejected`] with the server's
    /// diagnostic.
    pub async fn connect(params: &ConnectParams) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((params.host.as_str(), params.port)).await?;
        let mut client = Self {
            framed: Framed::new(stream, ClientCodec::new()),
            server_params: HashMap::new(),
            backend_pid: 0,
            backend_secret_key: 0,
        };

        client
            .framed
            .send(FrontendMessage::Startup {
                parameters: StartupParameters {
                    user: params.user.clone(),
                    database: Some(params.database.clone()),
                    application_name: Some(params.application_name.clone()),
                },
            })
            .await?;

        loop {
            match client.next_message().await? {
                BackendMessage::Authentication(AuthenticationRequest::Ok) => {}
                BackendMessage::Authentication(AuthenticationRequest::CleartextPassword) => {
                    client
                        .framed
                        .send(FrontendMessage::Password(params.password.clone()))
                        .await?;
                }
                BackendMessage::Authentication(AuthenticationRequest::Other(code)) => {
                    return Err(ClientError::UnsupportedAuth(code));
                }
                BackendMessage::ParameterStatus { name, value } => {
                    client.server_params.insert(name, value);
                }
                BackendMessage::BackendKeyData {
                    process_id,
                    secret_key,
                } => {
                    client.backend_pid = process_id;
                    client.backend_secret_key = secret_key;
                }
                BackendMessage::NoticeResponse(notice) => eprintln!("{}", notice),
                BackendMessage::ErrorResponse(info) => return Err(ClientError::Rejected(info)),
                BackendMessage::ReadyForQuery { .. } => return Ok(client),
                _ => return Err(ClientError::UnexpectedMessage("during startup")),
            }
        }
    }

    /// Runs one parameter-free statement and collects its outcome.
    ///
    /// `result_format` selects the protocol path: the Simple Query protocol
    /// only ever delivers text cells, so binary results go through the
    /// Extended Query protocol.
    pub async fn query(
        &mut self,
        sql: &str,
        result_format: FormatCode,
    ) -> Result<ExecOutcome, ClientError> {
        match result_format {
            FormatCode::Text => self.simple_query(sql).await,
            FormatCode::Binary => self.extended_query(sql, result_format).await,
        }
    }

    /// Runs a statement via the Simple Query protocol (text-format cells).
    pub async fn simple_query(&mut self, sql: &str) -> Result<ExecOutcome, ClientError> {
        self.framed
            .send(FrontendMessage::Query(sql.to_string()))
            .await?;
        self.collect_outcome().await
    }

    /// Runs a statement via the Extended Query protocol
    /// (Parse/Bind/Describe/Execute/Sync) with the requested result format.
    ///
    /// Uses the unnamed statement and portal and binds no parameters; the
    /// portal is run to completion (max_rows = 0), so no PortalSuspended
    /// handling is needed.
    pub async fn extended_query(
        &mut self,
        sql: &str,
        result_format: FormatCode,
    ) -> Result<ExecOutcome, ClientError> {
        self.framed
            .feed(FrontendMessage::Parse {
                statement_name: String::new(),
                query: sql.to_string(),
                param_types: vec![],
            })
            .await?;
        self.framed
            .feed(FrontendMessage::Bind {
                portal_name: String::new(),
                statement_name: String::new(),
                param_format_codes: vec![],
                param_values: vec![],
                result_format_codes: vec![result_format],
            })
            .await?;
        self.framed
            .feed(FrontendMessage::Describe {
                target: DescribeTarget::Portal,
                name: String::new(),
            })
            .await?;
        self.framed
            .feed(FrontendMessage::Execute {
                portal_name: String::new(),
                max_rows: 0,
            })
            .await?;
        self.framed.send(FrontendMessage::Sync).await?;
        self.collect_outcome().await
    }

    /// Consumes backend messages until ReadyForQuery, assembling the
    /// outcome of the statement that was just issued.
    ///
    /// After an ErrorResponse the stream is still drained to ReadyForQuery
    /// so the session remains usable.
    async fn collect_outcome(&mut self) -> Result<ExecOutcome, ClientError> {
        let mut columns: Option<Vec<FieldDescription>> = None;
        let mut rows: Vec<Vec<Option<Vec<u8>>>> = Vec::new();
        let mut tag: Option<String> = None;
        let mut server_error: Option<ErrorInfo> = None;

        loop {
            match self.next_message().await? {
                BackendMessage::ParseComplete | BackendMessage::BindComplete => {}
                BackendMessage::NoData => {}
                BackendMessage::ParameterDescription { .. } => {}
                BackendMessage::RowDescription { fields } => columns = Some(fields),
                BackendMessage::DataRow { values } => match &columns {
                    None => {
                        return Err(ClientError::UnexpectedMessage(
                            "DataRow before RowDescription",
                        ));
                    }
                    Some(fields) if values.len() != fields.len() => {
                        return Err(ClientError::UnexpectedMessage(
                            "DataRow width does not match RowDescription",
                        ));
                    }
                    Some(_) => rows.push(values),
                },
                BackendMessage::CommandComplete { tag: t } => tag = Some(t),
                BackendMessage::EmptyQueryResponse => tag = Some(String::new()),
                BackendMessage::ErrorResponse(info) => server_error = Some(info),
                BackendMessage::NoticeResponse(notice) => eprintln!("{}", notice),
                BackendMessage::ParameterStatus { name, value } => {
                    self.server_params.insert(name, value);
                }
                BackendMessage::ReadyForQuery { .. } => break,
                _ => {
                    return Err(ClientError::UnexpectedMessage(
                        "while awaiting query results",
                    ));
                }
            }
        }

        if let Some(info) = server_error {
            return Ok(ExecOutcome::ServerError(info));
        }
        match columns {
            Some(columns) => Ok(ExecOutcome::Rows(ResultSet::new(
                columns,
                rows,
                tag.unwrap_or_default(),
            ))),
            None => Ok(ExecOutcome::Command {
                tag: tag.unwrap_or_default(),
            }),
        }
    }

    /// Reads the next backend message, mapping EOF to
    /// [`ClientError::ConnectionClosed`].
    async fn next_message(&mut self) -> Result<BackendMessage, ClientError> {
        match self.framed.next().await {
            Some(Ok(msg)) => Ok(msg),
            Some(Err(e)) => Err(e.into()),
            None => Err(ClientError::ConnectionClosed),
        }
    }

    /// A server-reported parameter from the startup exchange
    /// (e.g. `server_version`).
    pub fn server_parameter(&self, name: &str) -> Option<&str> {
        self.server_params.get(name).map(String::as_str)
    }

    /// Process ID of the backend serving this session.
    pub fn backend_pid(&self) -> i32 {
        self.backend_pid
    }

    /// Secret key for out-of-band cancel requests. Received and stored;
    /// this client never cancels, but a caller could.
    pub fn backend_secret_key(&self) -> i32 {
        self.backend_secret_key
    }

    /// Sends Terminate and closes the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.framed.send(FrontendMessage::Terminate).await?;
        Ok(())
    }
}
