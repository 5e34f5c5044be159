use std::process::ExitCode;

use pgprobe::client::{Client, ClientError, ConnectParams, ExecOutcome};
use pgprobe::decode;
use pgprobe::protocol::{FormatCode, type_oid};
use pgprobe::schema::{ColumnExpectation, SchemaExpectation};

// The target table, created as:
//
//   CREATE TABLE "my_table" (
//     "number" integer NOT NULL,
//     "english" character varying(11) NOT NULL
//   );
//
// Changing the table means changing this descriptor and the queries below
// together.
const MY_TABLE: SchemaExpectation = SchemaExpectation::new(&[
    ColumnExpectation {
        name: "number",
        type_oid: type_oid::INT4,
    },
    ColumnExpectation {
        name: "english",
        type_oid: type_oid::VARCHAR,
    },
]);

/// Vacuous filter: exercises the full verify path on a zero-row result.
const QUERY_NO_ROWS: &str = "SELECT * FROM my_table WHERE false;";

/// Matching filter: returns the actual table contents for decoding.
const QUERY_MATCHING: &str = "SELECT * FROM my_table WHERE number >= 0;";

fn print_horizontal_bar() {
    eprintln!("{}", "-".repeat(30));
}

/// Prints a server-supplied diagnostic block, bar-delimited, to stderr.
fn report_server_error(heading: &str, detail: &str) {
    eprintln!("{}", heading);
    print_horizontal_bar();
    eprintln!("{}", detail);
    print_horizontal_bar();
    eprintln!();
}

/// Runs one fixed query and walks its result through verification and
/// decoding. Returns true if every stage passed.
async fn run_query(client: &mut Client, sql: &str, result_format: FormatCode) -> bool {
    println!("Query ({:?} results): {}", result_format, sql);

    let outcome = match client.query(sql, result_format).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // Transport failure: no result object to inspect.
            eprintln!(
                "Error attempting query: {}. Likely causes: failed network connection, server down, or out-of-memory",
                e
            );
            return false;
        }
    };

    match outcome {
        ExecOutcome::Command { .. } => {
            eprintln!("Expected to run a command which returns column data");
            false
        }
        ExecOutcome::ServerError(info) => {
            report_server_error("Error attempting query:", &info.to_string());
            false
        }
        ExecOutcome::Rows(result) => {
            let report = MY_TABLE.verify(&result);
            for check in report.checks() {
                if check.passed {
                    println!("{}", check.message);
                } else {
                    eprintln!("{}", check.message);
                }
            }
            if !report.passed() {
                return false;
            }
            println!("All schema checks passed");

            match decode::decode_rows(&result) {
                Ok(rows) => {
                    println!("{} row(s):", rows.len());
                    for row in &rows {
                        println!("  {} | {}", row.number, row.text);
                    }
                    true
                }
                Err(e) => {
                    eprintln!("Error decoding row data: {}", e);
                    false
                }
            }
        }
    }
}

async fn run(params: &ConnectParams) -> bool {
    let mut client = match Client::connect(params).await {
        Ok(client) => client,
        Err(ClientError::Rejected(info)) => {
            report_server_error("Unable to connect. Reason:", &info.to_string());
            return false;
        }
        Err(e) => {
            report_server_error("Unable to connect. Reason:", &e.to_string());
            return false;
        }
    };

    println!(
        "Connected (server version {}, backend pid {})",
        client.server_parameter("server_version").unwrap_or("?"),
        client.backend_pid()
    );

    let mut all_ok = run_query(&mut client, QUERY_NO_ROWS, FormatCode::Text).await;
    all_ok &= run_query(&mut client, QUERY_MATCHING, FormatCode::Binary).await;

    // The session is released exactly once on every path: close() consumes
    // the client, and the early returns above never constructed one.
    if let Err(e) = client.close().await {
        eprintln!("Error closing connection: {}", e);
        all_ok = false;
    }

    all_ok
}

#[tokio::main]
async fn main() -> ExitCode {
    // A network connection to localhost is not the same thing as a default
    // peer connection; testuser is assumed to allow only network logins.
    let params = ConnectParams {
        application_name: "pgprobe".to_string(),
        host: "localhost".to_string(),
        port: 5432,
        user: "testuser".to_string(),
        password: "testuser".to_string(),
        database: "my_database".to_string(),
    };

    let ok = run(&params).await;

    println!("Terminating");

    // Success vs. failure only; failure modes all map to the same code.
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
