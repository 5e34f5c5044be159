//! Result-shape verification against a compiled-in expectation.
//!
//! A [`SchemaExpectation`] declares the shape a query's result set must
//! have — column count, per-column type OID, per-column name — once, as a
//! single ordered descriptor. [`verify`](SchemaExpectation::verify) checks
//! a received [`ResultSet`] against it and reports one pass/fail line per
//! check, so every problem shows up in a single run.

use crate::client::ResultSet;

/// Expected name and type OID for one result column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnExpectation {
    /// Exact column name; compared byte-for-byte, no normalization.
    pub name: &'static str,
    /// Expected wire type OID (see [`crate::protocol::type_oid`]).
    pub type_oid: i32,
}

/// The declared shape of a query result: an ordered list of column
/// expectations. Its length is the expected column count.
#[derive(Debug, Clone, Copy)]
pub struct SchemaExpectation {
    columns: &'static [ColumnExpectation],
}

/// One verification check with its human-readable diagnostic.
#[derive(Debug)]
pub struct SchemaCheck {
    /// Whether this check passed.
    pub passed: bool,
    /// Diagnostic line for this check.
    pub message: String,
}

/// Result of verifying a result set: the per-check diagnostics and the
/// aggregated verdict.
#[derive(Debug)]
pub struct SchemaReport {
    checks: Vec<SchemaCheck>,
}

impl SchemaReport {
    /// True iff every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// All checks in the order they ran.
    pub fn checks(&self) -> &[SchemaCheck] {
        &self.checks
    }
}

impl SchemaExpectation {
    /// Declares an expectation over an ordered set of columns.
    pub const fn new(columns: &'static [ColumnExpectation]) -> Self {
        Self { columns }
    }

    /// Expected number of result columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Verifies `result` against this expectation.
    ///
    /// The column-count check gates everything else: on a count mismatch
    /// the report holds that single failure and no type or name checks run,
    /// since their per-index preconditions would not hold. Once the count
    /// matches, every type check and every name check runs regardless of
    /// earlier failures, one diagnostic line each.
    pub fn verify(&self, result: &ResultSet) -> SchemaReport {
        let mut checks = Vec::new();

        let expected = self.column_count();
        let actual = result.num_columns();
        if actual != expected {
            checks.push(SchemaCheck {
                passed: false,
                message: format!(
                    "incorrect number of columns: expected {} but found {}",
                    expected, actual
                ),
            });
            return SchemaReport { checks };
        }
        checks.push(SchemaCheck {
            passed: true,
            message: format!("as expected, we have {} columns", expected),
        });

        for (i, column) in self.columns.iter().enumerate() {
            let actual_oid = result.column_type(i);
            if actual_oid == column.type_oid {
                checks.push(SchemaCheck {
                    passed: true,
                    message: format!("correct type found for column {}", i),
                });
            } else {
                checks.push(SchemaCheck {
                    passed: false,
                    message: format!(
                        "incorrect type for column {}: OID {} (expected {})",
                        i, actual_oid, column.type_oid
                    ),
                });
            }
        }

        for (i, column) in self.columns.iter().enumerate() {
            let actual_name = result.column_name(i);
            if actual_name == column.name {
                checks.push(SchemaCheck {
                    passed: true,
                    message: format!("correct name for column {}: \"{}\"", i, actual_name),
                });
            } else {
                checks.push(SchemaCheck {
                    passed: false,
                    message: format!(
                        "incorrect name for column {}: \"{}\" (expected \"{}\")",
                        i, actual_name, column.name
                    ),
                });
            }
        }

        SchemaReport { checks }
    }
}
