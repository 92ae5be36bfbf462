use super::{SolverBackend, SolverError, SolverOutcome};
use crate::core::qubo::BinaryQuadraticProblem;
use crate::engine::config::{PayloadFormat, RemoteSolverConfig};
use crate::engine::progress::{Progress, ProgressReporter};
use rand::rngs::StdRng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const TOKEN_ENV_VAR: &str = "QSTRUCT_SOLVER_TOKEN";

const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
enum SolveRequest<'a> {
    Qubo {
        num_variables: usize,
        /// Row-major, full symmetric matrix.
        matrix: Vec<Vec<f64>>,
        offset: f64,
    },
    Ising {
        h: &'a [f64],
        couplings: &'a [(usize, usize, f64)],
        offset: f64,
    },
}

#[derive(Deserialize)]
struct SolveResponse {
    solution: Vec<f64>,
}

/// Client for an external annealing service speaking a small JSON protocol:
/// `POST {endpoint}` with a bearer token and a `qubo` or `ising` payload,
/// answered by `{"solution": [...]}` holding binary or spin values.
pub struct RemoteServiceSolver {
    config: RemoteSolverConfig,
    token: String,
    client: Client,
}

impl RemoteServiceSolver {
    pub const NAME: &'static str = "remote-service";

    pub fn new(config: RemoteSolverConfig) -> Result<Self, SolverError> {
        if config.endpoint.trim().is_empty() {
            return Err(SolverError::MissingEndpoint);
        }
        let token = resolve_token(config.token.as_deref(), std::env::var(TOKEN_ENV_VAR).ok())
            .ok_or(SolverError::MissingCredentials)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SolverError::Transport(e.to_string()))?;
        Ok(Self {
            config,
            token,
            client,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SolverError {
        if err.is_timeout() {
            SolverError::Timeout {
                seconds: self.config.timeout.as_secs(),
            }
        } else {
            SolverError::Transport(err.to_string())
        }
    }
}

impl SolverBackend for RemoteServiceSolver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(level = "debug", skip_all, fields(endpoint = %self.config.endpoint))]
    fn solve(
        &self,
        problem: &BinaryQuadraticProblem,
        _rng: &mut StdRng,
        reporter: &ProgressReporter,
    ) -> Result<SolverOutcome, SolverError> {
        let n = problem.num_variables();
        reporter.report(Progress::Message(format!(
            "Sending {n}-variable problem to {}",
            self.config.endpoint
        )));

        let ising;
        let request = match self.config.format {
            PayloadFormat::Qubo => SolveRequest::Qubo {
                num_variables: n,
                matrix: problem
                    .matrix()
                    .row_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect(),
                offset: problem.offset(),
            },
            PayloadFormat::Ising => {
                ising = problem.to_ising();
                SolveRequest::Ising {
                    h: &ising.h,
                    couplings: &ising.couplings,
                    offset: ising.offset,
                }
            }
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(SolverError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().map_err(|e| self.map_transport_error(e))?;
        let assignment = parse_solution(&body, n)?;
        let energy = problem.shifted_energy(&assignment)?;
        debug!(energy, "Remote solution received.");

        Ok(SolverOutcome {
            assignment,
            energy,
            backend: Self::NAME,
        })
    }
}

/// An explicit token wins over the environment; blank values count as unset.
fn resolve_token(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| from_env.filter(|t| !t.trim().is_empty()))
}

/// Accepts a binary (`0/1`) or spin (`−1/+1`) vector of the expected length.
fn parse_solution(body: &str, expected_len: usize) -> Result<Vec<bool>, SolverError> {
    let response: SolveResponse = serde_json::from_str(body)
        .map_err(|e| SolverError::MalformedResponse(e.to_string()))?;
    let values = response.solution;
    if values.len() != expected_len {
        return Err(SolverError::MalformedResponse(format!(
            "expected {expected_len} values, got {}",
            values.len()
        )));
    }

    let has_zero = values.contains(&0.0);
    let has_minus_one = values.contains(&-1.0);
    if has_zero && has_minus_one {
        return Err(SolverError::MalformedResponse(
            "solution mixes binary and spin values".to_string(),
        ));
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| match v {
            v if v == 1.0 => Ok(true),
            v if v == 0.0 || v == -1.0 => Ok(false),
            other => Err(SolverError::MalformedResponse(format!(
                "value {other} at position {i} is neither binary nor spin"
            ))),
        })
        .collect()
}
