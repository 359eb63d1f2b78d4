//! Source verification on an Etherscan compatible block explorer.

use std::{collections::BTreeMap, time::Duration};

use alloy::primitives::Address;
use json::JsonValue;
use reqwest::Client;
use tracing::{debug, info};

use crate::{build::BuildInfo, config::EtherscanConfig, errors::ScriptError};

/// How many times the verification status is polled
const STATUS_POLL_ATTEMPTS: usize = 10;

/// Delay between two status polls
const STATUS_POLL_DELAY: Duration = Duration::from_secs(5);

/// Everything the explorer needs to rebuild a contract
pub struct VerificationRequest {
    pub address: Address,
    pub contract_name: String,
    /// Source file declaring the contract
    pub source_name: String,
    /// Content of every compiled source, by source name
    pub sources: BTreeMap<String, String>,
    pub build: BuildInfo,
}

impl VerificationRequest {
    /// Compiler input in the solc standard json format
    pub fn standard_json_input(&self) -> JsonValue {
        let mut input = JsonValue::new_object();
        input["language"] = "Solidity".into();
        for (name, content) in &self.sources {
            input["sources"][name.as_str()]["content"] = content.as_str().into();
        }
        input["settings"]["optimizer"]["enabled"] = self.build.optimizer.enabled.into();
        input["settings"]["optimizer"]["runs"] = self.build.optimizer.runs.into();
        input["settings"]["outputSelection"]["*"]["*"] =
            JsonValue::from(vec!["abi", "evm.bytecode", "evm.deployedBytecode"]);
        input
    }

    /// `source:Contract` name the explorer expects with a standard json input
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// Answer to a verification submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Queued, to be followed up with this guid
    Queued(String),
    AlreadyVerified,
}

/// State of a queued verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
}

/// Client of the explorer API
pub struct ExplorerClient {
    http: Client,
    api_url: String,
    api_key: String,
    poll_attempts: usize,
    poll_delay: Duration,
}

impl ExplorerClient {
    pub fn new(config: &EtherscanConfig) -> Result<Self, ScriptError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScriptError::Verification(String::from("no explorer API key configured")))?;

        Ok(Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            poll_attempts: STATUS_POLL_ATTEMPTS,
            poll_delay: STATUS_POLL_DELAY,
        })
    }

    /// Change how many times, and how often, a submission is checked
    pub fn with_polling(mut self, attempts: usize, delay: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_delay = delay;
        self
    }

    /// Submit the source and wait for the explorer to verify it
    pub async fn verify(&self, request: &VerificationRequest) -> Result<(), ScriptError> {
        let guid = match self.submit(request).await? {
            Submission::AlreadyVerified => {
                info!("{} is already verified", request.address);
                return Ok(());
            }
            Submission::Queued(guid) => guid,
        };
        info!("Verification submitted, guid {}", guid);

        let attempts = self.poll_attempts;
        for attempt in 1..=attempts {
            tokio::time::sleep(self.poll_delay).await;
            match self.check(&guid).await? {
                VerificationStatus::Verified => {
                    info!("{} verified", request.address);
                    return Ok(());
                }
                VerificationStatus::Pending => {
                    debug!("Verification pending ({attempt}/{attempts})")
                }
            }
        }

        Err(ScriptError::Verification(format!(
            "verification {guid} still pending after {attempts} checks"
        )))
    }

    /// Send the `verifysourcecode` request
    pub async fn submit(&self, request: &VerificationRequest) -> Result<Submission, ScriptError> {
        let address = format!("{:#x}", request.address);
        let compiler_version = format!("v{}", request.build.solc_long_version);
        let source_code = json::stringify(request.standard_json_input());
        let contract_name = request.qualified_name();

        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", source_code.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
        ];

        let body = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .text()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        parse_submit_response(&body)
    }

    /// Query the state of a submission
    pub async fn check(&self, guid: &str) -> Result<VerificationStatus, ScriptError> {
        let body = self
            .http
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .text()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        parse_status_response(&body)
    }
}

/// Split an explorer answer into its success flag and result text
fn parse_response(body: &str) -> Result<(bool, String), ScriptError> {
    let parsed: JsonValue = json::parse(body)
        .map_err(|e| ScriptError::Verification(format!("unexpected explorer response: {e}")))?;

    let success = parsed["status"] == "1";
    let result = parsed["result"].as_str().unwrap_or_default().to_string();
    Ok((success, result))
}

pub fn parse_submit_response(body: &str) -> Result<Submission, ScriptError> {
    match parse_response(body)? {
        (true, guid) => Ok(Submission::Queued(guid)),
        (false, result) if result.to_lowercase().contains("already verified") => {
            Ok(Submission::AlreadyVerified)
        }
        (false, result) => Err(ScriptError::Verification(result)),
    }
}

pub fn parse_status_response(body: &str) -> Result<VerificationStatus, ScriptError> {
    match parse_response(body)? {
        (true, _) => Ok(VerificationStatus::Verified),
        (false, result) if result.to_lowercase().contains("already verified") => {
            Ok(VerificationStatus::Verified)
        }
        (false, result) if result.to_lowercase().contains("pending") => {
            Ok(VerificationStatus::Pending)
        }
        (false, result) => Err(ScriptError::Verification(result)),
    }
}
