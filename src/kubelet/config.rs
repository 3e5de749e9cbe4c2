use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// KubeletConfiguration contains the configuration for the kubelet
///
/// Only the fields this crate sets (or lets the operator override) are
/// modeled; everything else rides through the open extra-config mapping.
///
/// https://kubernetes.io/docs/reference/config-api/kubelet-config.v1beta1/
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletConfiguration {
  /// Kind is a string value representing the REST resource this object represents.
  kind: String,

  /// APIVersion defines the versioned schema of this representation of an object.
  api_version: String,

  /// address is the IP address for the kubelet to serve on (set to 0.0.0.0 for all interfaces)
  #[serde(skip_serializing_if = "Option::is_none")]
  address: Option<String>,

  /// authentication specifies how requests to the kubelet's server are authenticated
  authentication: Authentication,

  /// authorization specifies how requests to the kubelet's server are authorized
  authorization: Authorization,

  /// cgroupDriver is the driver the kubelet uses to manipulate cgroups on the host
  #[serde(skip_serializing_if = "Option::is_none")]
  cgroup_driver: Option<String>,

  /// cgroupRoot is the root cgroup to use for pods
  #[serde(skip_serializing_if = "Option::is_none")]
  cgroup_root: Option<String>,

  /// clusterDomain is the DNS domain for this cluster
  #[serde(skip_serializing_if = "Option::is_none")]
  cluster_domain: Option<String>,

  /// clusterDNS is a list of IP addresses for the cluster DNS server
  #[serde(rename = "clusterDNS", skip_serializing_if = "Option::is_none")]
  cluster_dns: Option<Vec<String>>,

  /// featureGates is a map of feature names to bools that enable or disable
  /// experimental features
  #[serde(skip_serializing_if = "Option::is_none")]
  feature_gates: Option<BTreeMap<String, bool>>,

  /// maxPods is the maximum number of pods that can run on this kubelet
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_pods: Option<i32>,

  /// readOnlyPort is the read-only port for the kubelet to serve on with no
  /// authentication/authorization (set to 0 to disable)
  #[serde(skip_serializing_if = "Option::is_none")]
  read_only_port: Option<i32>,

  /// resolvConf is the resolver configuration file used as the basis for the
  /// container DNS resolution configuration
  #[serde(skip_serializing_if = "Option::is_none")]
  resolv_conf: Option<String>,

  /// serializeImagePulls when enabled, tells the kubelet to pull images one at a time
  #[serde(skip_serializing_if = "Option::is_none")]
  serialize_image_pulls: Option<bool>,

  /// serverTLSBootstrap enables server certificate bootstrap
  #[serde(rename = "serverTLSBootstrap", skip_serializing_if = "Option::is_none")]
  server_tls_bootstrap: Option<bool>,
}

const KUBELET_DOC: &str = "kubelet configuration";

impl KubeletConfiguration {
  /// Baseline configuration common to all OS families
  pub fn new(client_ca_file: &str) -> Self {
    KubeletConfiguration {
      kind: "KubeletConfiguration".to_string(),
      api_version: "kubelet.config.k8s.io/v1beta1".to_string(),
      address: Some("0.0.0.0".to_string()),
      authentication: Authentication {
        anonymous: AuthnAnonymous { enabled: false },
        webhook: AuthnWebhook {
          cache_ttl: "2m0s".to_string(),
          enabled: true,
        },
        x509: AuthnX509 {
          client_ca_file: client_ca_file.to_string(),
        },
      },
      authorization: Authorization {
        mode: "Webhook".to_string(),
        webhook: AuthzWebhook {
          cache_authorized_ttl: "5m0s".to_string(),
          cache_unauthorized_ttl: "30s".to_string(),
        },
      },
      cgroup_driver: Some("systemd".to_string()),
      cgroup_root: Some("/".to_string()),
      cluster_domain: Some("cluster.local".to_string()),
      feature_gates: Some(BTreeMap::from([("RotateKubeletServerCertificate".to_string(), true)])),
      read_only_port: Some(0),
      serialize_image_pulls: Some(false),
      server_tls_bootstrap: Some(true),
      ..KubeletConfiguration::default()
    }
  }

  /// Render the configuration as a YAML document with the node group's extra
  /// configuration merged over the baseline
  pub fn render(&self, extra: &BTreeMap<String, serde_json::Value>) -> Result<String> {
    let value = serde_yaml::to_value(self).map_err(render_err)?;
    let Value::Mapping(mut doc) = value else {
      return Err(Error::Render {
        what: KUBELET_DOC,
        reason: "expected a mapping document".to_owned(),
      });
    };

    let mut overlay = Mapping::new();
    for (key, value) in extra {
      overlay.insert(Value::String(key.clone()), serde_yaml::to_value(value).map_err(render_err)?);
    }
    merge_mapping(&mut doc, overlay, KUBELET_DOC)?;

    serde_yaml::to_string(&Value::Mapping(doc)).map_err(render_err)
  }
}

fn render_err(err: serde_yaml::Error) -> Error {
  Error::Render {
    what: KUBELET_DOC,
    reason: err.to_string(),
  }
}

/// Deep-merge `overlay` into `base`
///
/// Mappings merge recursively; replacing a mapping with a scalar (or a scalar
/// with a mapping) is a type conflict
fn merge_mapping(base: &mut Mapping, overlay: Mapping, context: &str) -> Result<()> {
  for (key, value) in overlay {
    let label = key.as_str().unwrap_or("<non-string key>").to_owned();
    match base.get_mut(&key) {
      Some(existing) => match (existing, value) {
        (Value::Mapping(base), Value::Mapping(overlay)) => merge_mapping(base, overlay, &label)?,
        (existing, value) if existing.is_mapping() || value.is_mapping() => {
          return Err(Error::Render {
            what: KUBELET_DOC,
            reason: format!("type conflict for key `{label}` under `{context}`"),
          });
        }
        (existing, value) => *existing = value,
      },
      None => {
        base.insert(key, value);
      }
    }
  }

  Ok(())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Authentication {
  anonymous: AuthnAnonymous,
  webhook: AuthnWebhook,
  x509: AuthnX509,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthnAnonymous {
  enabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthnWebhook {
  #[serde(rename = "cacheTTL")]
  cache_ttl: String,
  enabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthnX509 {
  #[serde(rename = "clientCAFile")]
  client_ca_file: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Authorization {
  mode: String,
  webhook: AuthzWebhook,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthzWebhook {
  #[serde(rename = "cacheAuthorizedTTL")]
  cache_authorized_ttl: String,
  #[serde(rename = "cacheUnauthorizedTTL")]
  cache_unauthorized_ttl: String,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn it_renders_baseline_configuration() {
    let rendered = KubeletConfiguration::new("/etc/eksboot/ca.crt")
      .render(&BTreeMap::new())
      .unwrap();

    assert!(rendered.contains("kind: KubeletConfiguration"));
    assert!(rendered.contains("clientCAFile: /etc/eksboot/ca.crt"));
    assert!(rendered.contains("serverTLSBootstrap: true"));
    assert!(!rendered.contains("resolvConf"));
  }

  #[test]
  fn it_merges_scalar_overrides() {
    let extra = BTreeMap::from([
      ("maxPods".to_owned(), json!(58)),
      ("resolvConf".to_owned(), json!("/run/systemd/resolve/resolv.conf")),
    ]);

    let rendered = KubeletConfiguration::new("/etc/eksboot/ca.crt").render(&extra).unwrap();
    assert!(rendered.contains("maxPods: 58"));
    assert!(rendered.contains("resolvConf: /run/systemd/resolve/resolv.conf"));
  }

  #[test]
  fn it_merges_nested_mappings() {
    let extra = BTreeMap::from([("featureGates".to_owned(), json!({"KubeletCredentialProviders": true}))]);

    let rendered = KubeletConfiguration::new("/etc/eksboot/ca.crt").render(&extra).unwrap();
    assert!(rendered.contains("KubeletCredentialProviders: true"));
    assert!(rendered.contains("RotateKubeletServerCertificate: true"));
  }

  #[test]
  fn it_rejects_type_conflicts() {
    let extra = BTreeMap::from([("featureGates".to_owned(), json!("not-a-mapping"))]);

    let result = KubeletConfiguration::new("/etc/eksboot/ca.crt").render(&extra);
    assert!(matches!(result, Err(Error::Render { .. })));
  }

  #[test]
  fn it_rejects_nested_type_conflicts() {
    let extra = BTreeMap::from([("authentication".to_owned(), json!({"anonymous": "yes"}))]);

    let result = KubeletConfiguration::new("/etc/eksboot/ca.crt").render(&extra);
    assert!(matches!(result, Err(Error::Render { .. })));
  }
}
