//! Sign command: produce a bound request for use with any HTTP client.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use shlink_crypto::KeyPair;
use shlink_gateway::{InboundRequest, RequestSigner};

/// What to sign.
#[derive(Debug)]
pub(crate) struct SignArgs<'a> {
    pub(crate) method: &'a str,
    pub(crate) url: &'a str,
    pub(crate) body: Option<&'a str>,
    pub(crate) token: Option<&'a str>,
}

/// Sign a request with the key at `key_path`.
pub(crate) fn build_request(key_path: &Path, args: &SignArgs<'_>) -> Result<InboundRequest> {
    let key = KeyPair::load_or_generate(key_path)
        .with_context(|| format!("loading key from {}", key_path.display()))?;
    let signer = RequestSigner::new(key);

    let body = args
        .body
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("body is not valid JSON")?;

    Ok(signer.sign(args.method, args.url, body.as_ref(), args.token)?)
}

/// Print the signed request, as JSON when `json` is set.
pub(crate) fn run_sign(key_path: &Path, args: &SignArgs<'_>, json: bool) -> Result<()> {
    let request = build_request(key_path, args)?;
    let body = request
        .body
        .as_deref()
        .map(String::from_utf8_lossy)
        .map(|b| b.into_owned());

    if json {
        let headers: serde_json::Map<String, Value> = request
            .headers
            .iter()
            .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
            .collect();
        let rendered = serde_json::json!({
            "method": request.method,
            "url": request.url,
            "headers": headers,
            "body": body,
        });
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }

    println!("{} {}", request.method, request.url);
    for (name, value) in request.headers.iter() {
        println!("{name}: {value}");
    }
    if let Some(body) = body {
        println!();
        println!("{body}");
    }
    Ok(())
}
