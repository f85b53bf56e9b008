use std::sync::Arc;

use crate::metrics::types::MetricDescriptor;

/// The full descriptor set of the exporter. Construction is pure and total;
/// the set never changes after it is built.
pub struct ExporterDescriptors {
    pub version: Arc<MetricDescriptor>,
    pub up: Arc<MetricDescriptor>,
    pub cc_current: Arc<MetricDescriptor>,
    pub cc_limit: Arc<MetricDescriptor>,
    pub cc_max: Arc<MetricDescriptor>,
    pub cc_total: Arc<MetricDescriptor>,
    pub last_successful_update: Arc<MetricDescriptor>,
    pub next_update: Arc<MetricDescriptor>,
    pub build_info: Arc<MetricDescriptor>,
}

impl ExporterDescriptors {
    pub fn new() -> Self {
        Self {
            version: MetricDescriptor::gauge(
                "openvpnas_server_version_info",
                "Contains OpenVPN AS server version info",
                &["version"],
            ),
            up: MetricDescriptor::gauge(
                "openvpnas_up",
                "Whether scraping OpenVPN AS metrics was successful.",
                &[],
            ),
            cc_current: MetricDescriptor::gauge(
                "openvpnas_server_connected_clients",
                "Number of currently connected clients to the server.",
                &[],
            ),
            cc_limit: MetricDescriptor::gauge(
                "openvpnas_server_connected_clients_limit",
                "Server concurrent client connection limit.",
                &[],
            ),
            cc_max: MetricDescriptor::gauge(
                "openvpnas_subscription_connected_clients_limit",
                "Maximum number of concurrent client connections allowed by the OpenVPN AS \
                 subscription.",
                &[],
            ),
            cc_total: MetricDescriptor::gauge(
                "openvpnas_subscription_connected_clients",
                "Total number of client connections currently in use across the OpenVPN AS \
                 subscription.",
                &[],
            ),
            last_successful_update: MetricDescriptor::gauge(
                "openvpnas_subscription_status_last_update_time_seconds",
                "UNIX timestamp when the OpenVPN AS subscription was last synced.",
                &[],
            ),
            next_update: MetricDescriptor::gauge(
                "openvpnas_subscription_status_next_update_time_seconds",
                "UNIX timestamp of the next planned OpenVPN AS subscription sync.",
                &[],
            ),
            build_info: MetricDescriptor::gauge(
                "openvpnas_exporter_build_info",
                "Build information of the exporter itself.",
                &["version"],
            ),
        }
    }
}

impl Default for ExporterDescriptors {
    fn default() -> Self {
        Self::new()
    }
}
