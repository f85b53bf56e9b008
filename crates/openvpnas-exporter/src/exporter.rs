//! The scrape collector: one session, two sequential calls, a terminal
//! availability gauge.

use std::path::PathBuf;
use std::sync::Arc;

use openvpnas_rpc::RpcSession;
use tracing::warn;

use crate::agent::{SubscriptionStatus, VersionInfo};
use crate::metrics::{ExporterDescriptors, MetricSample};

pub struct Exporter {
    socket_path: PathBuf,
    descriptors: Arc<ExporterDescriptors>,
}

impl Exporter {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            descriptors: Arc::new(ExporterDescriptors::new()),
        }
    }

    pub fn descriptors(&self) -> &ExporterDescriptors {
        &self.descriptors
    }

    /// Runs one full scrape. Each invocation opens and closes its own
    /// session; a failed stage short-circuits the rest and the availability
    /// gauge is always the final sample. Samples emitted before the failing
    /// stage remain part of the scrape's output.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let mut samples = Vec::new();

        let mut session = match RpcSession::connect(&self.socket_path).await {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    error = %err,
                    socket = %self.socket_path.display(),
                    "unable to open xml-rpc session"
                );
                samples.push(self.descriptors.up.sample(&[], 0.0));
                return samples;
            }
        };

        let version = match self.fetch_version(&mut session).await {
            Ok(version) => version,
            Err(err) => {
                warn!(error = %err, "unable to fetch version metrics");
                samples.push(self.descriptors.up.sample(&[], 0.0));
                return samples;
            }
        };
        samples.push(self.descriptors.version.sample(&[&version.version], 1.0));

        let status = match self.fetch_subscription_status(&mut session).await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "unable to fetch subscription metrics");
                samples.push(self.descriptors.up.sample(&[], 0.0));
                return samples;
            }
        };

        let d = self.descriptors.as_ref();
        samples.push(d.cc_current.sample(&[], status.current_cc as f64));
        samples.push(d.cc_limit.sample(&[], status.cc_limit as f64));
        samples.push(d.cc_max.sample(&[], status.max_cc as f64));
        samples.push(d.cc_total.sample(&[], status.total_cc as f64));
        samples.push(
            d.last_successful_update
                .sample(&[], status.last_successful_update as f64),
        );
        samples.push(d.next_update.sample(&[], status.next_update as f64));
        samples.push(d.up.sample(&[], 1.0));
        samples
    }

    async fn fetch_version(&self, session: &mut RpcSession) -> openvpnas_rpc::Result<VersionInfo> {
        let value = session.call("GetASLongVersion").await?;
        VersionInfo::from_value(&value)
    }

    async fn fetch_subscription_status(
        &self,
        session: &mut RpcSession,
    ) -> openvpnas_rpc::Result<SubscriptionStatus> {
        let value = session.call("GetSubscriptionStatus").await?;
        SubscriptionStatus::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{UnixListener, UnixStream};

    use super::Exporter;

    /// One scripted turn of the fake agent: reply with a body, or hang up.
    enum Reply {
        Body(String),
        Close,
    }

    fn scratch_socket(tag: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "openvpnas-exporter-{}-{tag}.sock",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    /// Serves one connection, answering each request from the script, then
    /// drains until the client hangs up.
    fn spawn_fake_agent(socket_path: &Path, script: Vec<Reply>) -> tokio::task::JoinHandle<()> {
        let listener = UnixListener::bind(socket_path).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for reply in script {
                if read_request(&mut stream).await.is_none() {
                    return;
                }
                match reply {
                    Reply::Body(body) => {
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\n\
                             Content-Length: {}\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        stream.write_all(response.as_bytes()).await.unwrap();
                    }
                    Reply::Close => return,
                }
            }
            let mut sink = [0u8; 256];
            loop {
                match stream.read(&mut sink).await {
                    Ok(0) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        })
    }

    /// Reads one HTTP request (headers plus content-length body).
    async fn read_request(stream: &mut UnixStream) -> Option<()> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                let mut remaining = content_length.saturating_sub(buf.len() - pos - 4);
                while remaining > 0 {
                    let n = stream.read(&mut chunk).await.ok()?;
                    if n == 0 {
                        return None;
                    }
                    remaining = remaining.saturating_sub(n);
                }
                return Some(());
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn version_body(version: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?><methodResponse><params><param>\
             <value><string>{version}</string></value>\
             </param></params></methodResponse>"
        )
    }

    fn subscription_body() -> String {
        let members = [
            ("agent_disabled", "<boolean>0</boolean>".to_string()),
            ("agent_id", "<string>agent-1</string>".to_string()),
            ("cc_limit", "<int>100</int>".to_string()),
            ("current_cc", "<int>12</int>".to_string()),
            ("error", "<string></string>".to_string()),
            ("fallback_cc", "<int>5</int>".to_string()),
            ("grace_period", "<int>86400</int>".to_string()),
            ("last_successful_update", "<int>1700000000</int>".to_string()),
            ("last_successful_update_age", "<int>60</int>".to_string()),
            ("max_cc", "<int>500</int>".to_string()),
            ("name", "<string>sub</string>".to_string()),
            ("next_update", "<int>1700003600</int>".to_string()),
            ("next_update_in", "<int>3540</int>".to_string()),
            (
                "notes",
                "<array><data><value><string>renewal due</string></value></data></array>"
                    .to_string(),
            ),
            ("overdraft", "<boolean>0</boolean>".to_string()),
            ("server", "<string>as-1</string>".to_string()),
            ("state", "<string>ACTIVE</string>".to_string()),
            ("subkey", "<string>key</string>".to_string()),
            ("total_cc", "<int>480</int>".to_string()),
            ("type", "<string>cc</string>".to_string()),
            ("updates_failed", "<int>0</int>".to_string()),
        ];
        let mut body = String::from(
            "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>",
        );
        for (name, value) in members {
            body.push_str(&format!(
                "<member><name>{name}</name><value>{value}</value></member>"
            ));
        }
        body.push_str("</struct></value></param></params></methodResponse>");
        body
    }

    fn fault_body() -> String {
        "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><int>9007</int></value></member>\
         <member><name>faultString</name>\
         <value><string>XMLRPC_RELAY: no such method</string></value></member>\
         </struct></value></fault></methodResponse>"
            .to_string()
    }

    #[tokio::test]
    async fn successful_scrape_emits_full_sample_set() {
        let socket = scratch_socket("success");
        let agent = spawn_fake_agent(
            &socket,
            vec![
                Reply::Body(version_body("2.9.1")),
                Reply::Body(subscription_body()),
            ],
        );

        let exporter = Exporter::new(&socket);
        let samples = exporter.collect().await;

        assert_eq!(samples.len(), 8);
        assert_eq!(samples[0].descriptor.name, "openvpnas_server_version_info");
        assert_eq!(samples[0].label_values, vec!["2.9.1".to_string()]);
        assert_eq!(samples[0].value, 1.0);

        let expected = [
            ("openvpnas_server_connected_clients", 12.0),
            ("openvpnas_server_connected_clients_limit", 100.0),
            ("openvpnas_subscription_connected_clients_limit", 500.0),
            ("openvpnas_subscription_connected_clients", 480.0),
            (
                "openvpnas_subscription_status_last_update_time_seconds",
                1700000000.0,
            ),
            (
                "openvpnas_subscription_status_next_update_time_seconds",
                1700003600.0,
            ),
        ];
        for (sample, (name, value)) in samples[1..7].iter().zip(expected) {
            assert_eq!(sample.descriptor.name, name);
            assert_eq!(sample.value, value);
            assert!(sample.label_values.is_empty());
        }

        let up = samples.last().unwrap();
        assert_eq!(up.descriptor.name, "openvpnas_up");
        assert_eq!(up.value, 1.0);

        // The session must be released once the scrape ends; the agent task
        // only finishes after it sees the client hang up.
        tokio::time::timeout(Duration::from_secs(5), agent)
            .await
            .expect("agent still holds the connection")
            .unwrap();
        let _ = std::fs::remove_file(&socket);
    }

    #[tokio::test]
    async fn version_failure_emits_only_up_zero() {
        let socket = scratch_socket("stage-a");
        let agent = spawn_fake_agent(&socket, vec![Reply::Close]);

        let exporter = Exporter::new(&socket);
        let samples = exporter.collect().await;

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].descriptor.name, "openvpnas_up");
        assert_eq!(samples[0].value, 0.0);

        tokio::time::timeout(Duration::from_secs(5), agent)
            .await
            .expect("agent still holds the connection")
            .unwrap();
        let _ = std::fs::remove_file(&socket);
    }

    #[tokio::test]
    async fn subscription_fault_keeps_version_sample() {
        let socket = scratch_socket("stage-b");
        let agent = spawn_fake_agent(
            &socket,
            vec![
                Reply::Body(version_body("2.9.1")),
                Reply::Body(fault_body()),
            ],
        );

        let exporter = Exporter::new(&socket);
        let samples = exporter.collect().await;

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].descriptor.name, "openvpnas_server_version_info");
        assert_eq!(samples[0].label_values, vec!["2.9.1".to_string()]);
        assert_eq!(samples[1].descriptor.name, "openvpnas_up");
        assert_eq!(samples[1].value, 0.0);

        tokio::time::timeout(Duration::from_secs(5), agent)
            .await
            .expect("agent still holds the connection")
            .unwrap();
        let _ = std::fs::remove_file(&socket);
    }

    #[tokio::test]
    async fn missing_socket_emits_only_up_zero() {
        let exporter = Exporter::new("/nonexistent/openvpnas-exporter.sock");
        let samples = exporter.collect().await;

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].descriptor.name, "openvpnas_up");
        assert_eq!(samples[0].value, 0.0);
    }

    #[tokio::test]
    async fn descriptors_are_stable_across_scrapes() {
        let exporter = Exporter::new("/nonexistent/openvpnas-exporter.sock");
        let first = exporter.collect().await;
        let second = exporter.collect().await;

        assert!(Arc::ptr_eq(
            &first[0].descriptor,
            &second[0].descriptor
        ));
    }
}
