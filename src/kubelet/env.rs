use std::collections::BTreeMap;

use crate::cluster::{ClusterSpec, NodeGroupSpec, OsFamily};

/// Resolver path handed to the kubelet on Ubuntu 20.04, where systemd-resolved
/// owns /etc/resolv.conf
pub const UBUNTU_2004_RESOLV_CONF: &str = "/run/systemd/resolve/resolv.conf";

/// Environment parameters identifying the cluster to the bootstrap script
pub fn metadata_env_params(cluster: &ClusterSpec) -> Vec<String> {
  vec![
    format!("AWS_DEFAULT_REGION={}", cluster.region),
    format!("AWS_EKS_CLUSTER_NAME={}", cluster.name),
    format!("AWS_EKS_ENDPOINT={}", cluster.endpoint),
  ]
}

/// Environment parameters consumed by the kubelet unit at boot
///
/// The baseline entries are common to all OS families. A DNS override is
/// appended after them - additive, so the generated file stays diffable
/// against output produced without the override.
pub fn kubelet_env_params(node_group: &NodeGroupSpec) -> Vec<String> {
  let mut params = vec![
    format!("NODE_LABELS={}", node_group.formatted_labels()),
    format!("NODE_TAINTS={}", node_group.formatted_taints()),
  ];

  if let Some(max_pods) = node_group.max_pods_per_node {
    params.push(format!("MAX_PODS={max_pods}"));
  }

  if let Some(dns) = node_group.cluster_dns {
    params.push(format!("CLUSTER_DNS={dns}"));
  }

  params
}

/// The node group's extra kubelet configuration with family defaults filled
/// in where the operator left them unset
///
/// Returns an augmented copy - the caller's spec is never mutated, so
/// concurrent assemblies over a shared spec stay race free.
pub fn extra_kubelet_config(node_group: &NodeGroupSpec) -> BTreeMap<String, serde_json::Value> {
  let mut extra = node_group.kubelet_extra_config.clone().unwrap_or_default();

  // resolvConf default applies to Ubuntu 20.04 only; a value set by the operator wins
  if node_group.ami_family == OsFamily::Ubuntu2004 {
    extra
      .entry("resolvConf".to_owned())
      .or_insert_with(|| serde_json::Value::String(UBUNTU_2004_RESOLV_CONF.to_owned()));
  }

  extra
}

#[cfg(test)]
mod tests {
  use std::net::IpAddr;

  use rstest::rstest;
  use serde_json::json;

  use super::*;

  fn cluster() -> ClusterSpec {
    ClusterSpec {
      name: "orion".to_owned(),
      region: "us-west-2".to_owned(),
      endpoint: "https://A1B2C3.gr7.us-west-2.eks.amazonaws.com".to_owned(),
      certificate_authority_data: b"-----BEGIN CERTIFICATE-----".to_vec(),
    }
  }

  #[test]
  fn it_assembles_metadata_params() {
    assert_eq!(
      metadata_env_params(&cluster()),
      vec![
        "AWS_DEFAULT_REGION=us-west-2",
        "AWS_EKS_CLUSTER_NAME=orion",
        "AWS_EKS_ENDPOINT=https://A1B2C3.gr7.us-west-2.eks.amazonaws.com",
      ]
    );
  }

  #[test]
  fn it_appends_cluster_dns_after_baseline() {
    let node_group = NodeGroupSpec {
      cluster_dns: Some("10.0.0.10".parse::<IpAddr>().unwrap()),
      max_pods_per_node: Some(58),
      ..NodeGroupSpec::default()
    };

    let params = kubelet_env_params(&node_group);
    assert_eq!(params.last().map(String::as_str), Some("CLUSTER_DNS=10.0.0.10"));
    assert_eq!(params[2], "MAX_PODS=58");
  }

  #[test]
  fn it_omits_cluster_dns_without_override() {
    let params = kubelet_env_params(&NodeGroupSpec::default());
    assert!(!params.iter().any(|param| param.starts_with("CLUSTER_DNS=")));
  }

  #[rstest]
  #[case(OsFamily::AmazonLinux2, false)]
  #[case(OsFamily::Ubuntu1804, false)]
  #[case(OsFamily::Ubuntu2004, true)]
  fn it_defaults_resolv_conf_per_family(#[case] family: OsFamily, #[case] expected: bool) {
    let node_group = NodeGroupSpec {
      ami_family: family,
      ..NodeGroupSpec::default()
    };

    let extra = extra_kubelet_config(&node_group);
    assert_eq!(extra.contains_key("resolvConf"), expected);
  }

  #[test]
  fn it_never_overwrites_operator_resolv_conf() {
    let node_group = NodeGroupSpec {
      ami_family: OsFamily::Ubuntu2004,
      kubelet_extra_config: Some(BTreeMap::from([("resolvConf".to_owned(), json!("/custom/path"))])),
      ..NodeGroupSpec::default()
    };

    let extra = extra_kubelet_config(&node_group);
    assert_eq!(extra["resolvConf"], json!("/custom/path"));

    // the caller's spec is untouched
    assert_eq!(
      node_group.kubelet_extra_config.as_ref().unwrap()["resolvConf"],
      json!("/custom/path")
    );
  }
}
