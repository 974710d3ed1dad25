//! Demo command: the whole sharing flow against an in-process server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use shlink_config::Config;
use shlink_core::{AccessRequestItem, AccessType, INITIALIZE_REFERENCE};
use shlink_crypto::KeyPair;
use shlink_gateway::{
    AuthorizationServer, FhirBundleResources, GatewayResult, GrantRequest, GrantResponse,
    PolicyRequest, RequestSigner, ResourceProvider,
};
use tokio::task::JoinHandle;
use tracing::info;

use crate::theme::Theme;

/// Demo parameters.
#[derive(Debug, Clone)]
pub(crate) struct DemoOptions {
    /// Recipients that try to claim the link.
    pub(crate) claimants: u32,
    /// Claim limit the owner sets.
    pub(crate) claim_limit: u32,
    /// Optional PIN protecting the link.
    pub(crate) pin: Option<String>,
    /// FHIR bundle to serve instead of the built-in sample.
    pub(crate) bundle: Option<PathBuf>,
    /// File name shared from the bundle; its stem selects the entries.
    pub(crate) file: String,
}

struct Demo {
    server: Arc<AuthorizationServer>,
    sweeper: JoinHandle<()>,
    grant_url: String,
}

impl Demo {
    fn new(config: &Config, bundle: Value) -> Result<Self> {
        let resources: Arc<dyn ResourceProvider> = Arc::new(FhirBundleResources::new(bundle)?);
        let server = Arc::new(AuthorizationServer::from_config(config, resources)?);
        let sweeper = AuthorizationServer::spawn_token_sweeper(Arc::clone(&server));
        let grant_url = format!("{}/gnap", server.settings().public_url);
        Ok(Self {
            server,
            sweeper,
            grant_url,
        })
    }

    async fn grant(
        &self,
        signer: &RequestSigner,
        access: Vec<AccessRequestItem>,
        pin: Option<&str>,
    ) -> GatewayResult<GrantResponse> {
        let mut body = GrantRequest::new(access, signer.descriptor());
        if let Some(pin) = pin {
            body = body.with_pin(pin);
        }
        let request = signer.sign("POST", &self.grant_url, Some(&body), None)?;
        self.server.request_grant(&request).await
    }

    async fn fetch(&self, signer: &RequestSigner, url: &str, token: &str) -> Result<String> {
        let request = signer.get(url, Some(token))?;
        let response = self.server.handle(&request).await;
        Ok(match response.body.get("entry").and_then(Value::as_array) {
            Some(entries) => format!("{} ({} entries)", response.status, entries.len()),
            None => response.status.to_string(),
        })
    }
}

impl Drop for Demo {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

fn sample_bundle() -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": [
            {
                "fullUrl": "urn:uuid:patient",
                "resource": {"resourceType": "Patient", "name": [{"family": "Doe"}]},
            },
            observation("urn:uuid:glucose-1", "Glucose", &json!(5.4), "mmol/L"),
            observation("urn:uuid:glucose-2", "Glucose", &json!(6.1), "mmol/L"),
            observation("urn:uuid:heart-rate", "Heart rate", &json!(64), "/min"),
        ],
    })
}

fn observation(full_url: &str, code: &str, value: &Value, unit: &str) -> Value {
    json!({
        "fullUrl": full_url,
        "resource": {
            "resourceType": "Observation",
            "code": {"text": code},
            "valueQuantity": {"value": value, "unit": unit},
        },
    })
}

fn load_bundle(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(sample_bundle());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading bundle {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing bundle {}", path.display()))
}

fn first_location(grant: &GrantResponse, access_type: AccessType) -> Result<String> {
    grant
        .locations_of(access_type)
        .first()
        .map(|l| (*l).to_owned())
        .with_context(|| format!("grant lacks {access_type:?} access"))
}

/// Run the demo and print each step.
pub(crate) async fn run_demo(config: &Config, options: &DemoOptions) -> Result<()> {
    let demo = Demo::new(config, load_bundle(options.bundle.as_deref())?)?;
    let owner = RequestSigner::new(KeyPair::generate());

    println!("{}", Theme::header("Owner creates a package"));
    let init = demo
        .grant(
            &owner,
            vec![AccessRequestItem::Reference(INITIALIZE_REFERENCE.to_owned())],
            None,
        )
        .await?;
    let data_url = first_location(&init, AccessType::Modify)?;
    let policy_url = first_location(&init, AccessType::Share)?;
    println!("{}", Theme::field("data", &data_url));
    println!("{}", Theme::field("policy", &policy_url));

    let file = format!("{data_url}/{}", options.file);
    info!(location = %file, "Serving bundle");

    println!("\n{}", Theme::header("Owner shares it"));
    let terms = PolicyRequest {
        pin: options.pin.clone(),
        claim_limit: options.claim_limit,
        locations: vec![file.clone()],
    };
    let share = |terms: &PolicyRequest| -> GatewayResult<_> {
        owner.sign("PUT", &policy_url, Some(terms), Some(&init.access_token.value))
    };
    let link = demo.server.put_policy(&share(&terms)?).await?;
    println!(
        "{}",
        Theme::field(
            "link",
            serde_json::to_string(&link.gnap).context("rendering link")?
        )
    );

    println!("\n{}", Theme::header("Recipients claim the link"));
    let mut tokens = Vec::new();
    for n in 1..=options.claimants {
        let recipient = RequestSigner::new(KeyPair::generate());
        match demo
            .grant(
                &recipient,
                vec![AccessRequestItem::Reference(link.gnap.access.clone())],
                options.pin.as_deref(),
            )
            .await
        {
            Ok(grant) => {
                println!("{}", Theme::success(&format!("recipient {n} claimed")));
                tokens.push((recipient, grant.access_token.value));
            },
            Err(e) => println!("{}", Theme::refused(&format!("recipient {n}: {e}"))),
        }
    }

    let Some((first, token)) = tokens.first() else {
        bail!("no recipient could claim the link");
    };

    println!("\n{}", Theme::header("First recipient reads the bundle"));
    let outcome = demo.fetch(first, &file, token).await?;
    println!("  GET {file} -> {outcome}");

    println!("\n{}", Theme::header("Owner replaces the policy"));
    demo.server.put_policy(&share(&terms)?).await?;
    let outcome = demo.fetch(first, &file, token).await?;
    println!("  GET {file} -> {outcome} {}", Theme::dimmed("(earlier claims revoked)"));
    println!("{}", Theme::separator());

    Ok(())
}
