//! Helpers for unit tests: exposition text lookup and a fake push gateway

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::{service::service_fn, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

type Sample = (String, Vec<(String, String)>, f64);

/// Value of the first sample of `name` carrying all of `labels`
pub(crate) fn sample_value(text: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    samples(text, name, labels).first().map(|(_, _, value)| *value)
}

/// All samples of `name` carrying all of `labels`
pub(crate) fn samples(text: &str, name: &str, labels: &[(&str, &str)]) -> Vec<Sample> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(parse_sample)
        .filter(|(sample_name, sample_labels, _)| {
            sample_name == name
                && labels.iter().all(|(key, value)| {
                    sample_labels
                        .iter()
                        .any(|(label_key, label_value)| label_key == key && label_value == value)
                })
        })
        .collect()
}

fn parse_sample(line: &str) -> Option<Sample> {
    let (series, value) = line.rsplit_once(' ')?;
    let value = value.parse().ok()?;
    match series.split_once('{') {
        Some((name, rest)) => {
            let mut remaining = rest.strip_suffix('}')?;
            let mut labels = Vec::new();
            while !remaining.is_empty() {
                let (key, after) = remaining.split_once("=\"")?;
                let end = after.find('"')?;
                labels.push((key.to_string(), after[..end].to_string()));
                remaining = after[end + 1..].trim_start_matches(',');
            }
            Some((name.to_string(), labels, value))
        }
        None => Some((series.to_string(), Vec::new(), value)),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Answer every request with `status`
pub(crate) fn always(status: StatusCode) -> impl Fn(&Method, &str) -> StatusCode + Send + Sync + 'static {
    move |_: &Method, _: &str| status
}

/// Start a push gateway stand-in whose status per request comes from `respond`
///
/// Returns the base URL and a channel receiving each request it saw.
pub(crate) async fn spawn_fake_gateway<R>(respond: R) -> (String, mpsc::UnboundedReceiver<CapturedRequest>)
where
    R: Fn(&Method, &str) -> StatusCode + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let io = TokioIo::new(stream);
            let tx = tx.clone();
            let respond = Arc::clone(&respond);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let tx = tx.clone();
                    let respond = Arc::clone(&respond);
                    async move { capture(req, &tx, respond.as_ref()).await }
                });
                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    (format!("http://{}/", addr), rx)
}

async fn capture<R>(
    req: Request<Incoming>,
    tx: &mpsc::UnboundedSender<CapturedRequest>,
    respond: &R,
) -> Result<Response<Full<Bytes>>, hyper::Error>
where
    R: Fn(&Method, &str) -> StatusCode,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let status = respond(&method, &path);
    let body = req.into_body().collect().await?.to_bytes();

    let _ = tx.send(CapturedRequest {
        method: method.to_string(),
        path,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    Ok(Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap())
}
