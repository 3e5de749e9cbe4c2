use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{
  cluster::ClusterSpec,
  error::{Error, Result},
};

/// Mechanism a node uses to prove its identity to the cluster API server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authenticator {
  /// Token exchange through the standalone aws-iam-authenticator binary
  AwsIamAuthenticator,

  /// Token exchange through `aws eks get-token`
  AwsCli,
}

impl Default for Authenticator {
  fn default() -> Self {
    Self::AwsIamAuthenticator
  }
}

impl Authenticator {
  fn command(&self) -> &'static str {
    match self {
      Authenticator::AwsIamAuthenticator => "/usr/bin/aws-iam-authenticator",
      Authenticator::AwsCli => "aws",
    }
  }

  fn args(&self, cluster: &ClusterSpec) -> Vec<String> {
    match self {
      Authenticator::AwsIamAuthenticator => vec![
        "token".to_owned(),
        "-i".to_owned(),
        cluster.name.clone(),
        "--region".to_owned(),
        cluster.region.clone(),
      ],
      Authenticator::AwsCli => vec![
        "eks".to_owned(),
        "get-token".to_owned(),
        "--cluster-name".to_owned(),
        cluster.name.clone(),
        "--region".to_owned(),
        cluster.region.clone(),
      ],
    }
  }
}

/// Kubeconfig document used by the kubelet on the node
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeConfig {
  /// Kind is a string value representing the REST resource this object represents.
  kind: String,

  /// APIVersion defines the versioned schema of this representation of an object.
  api_version: String,

  /// Clusters defined in the kubeconfig
  clusters: Vec<NamedCluster>,

  /// Contexts binds names to cluster/user tuples
  contexts: Vec<NamedContext>,

  /// CurrentContext is the name of the default context
  #[serde(rename = "current-context")]
  current_context: String,

  /// Users defined in the kubeconfig
  users: Vec<NamedAuthInfo>,
}

impl KubeConfig {
  /// Build the kubeconfig a node's kubelet authenticates with
  ///
  /// The CA material is referenced by its on-node path rather than embedded,
  /// matching where the assembled file set writes `ca.crt`. Fails before any
  /// other work when the cluster spec carries no CA material - every file in
  /// the assembled set depends on it.
  pub fn new_for_node(cluster: &ClusterSpec, authenticator: Authenticator, ca_path: &str) -> Result<Self> {
    if cluster.certificate_authority_data.is_empty() {
      return Err(Error::MissingCredentialData("cluster certificate authority data is empty"));
    }

    Ok(KubeConfig {
      kind: "Config".to_owned(),
      api_version: "v1".to_owned(),
      clusters: vec![NamedCluster {
        cluster: Cluster {
          server: cluster.endpoint.clone(),
          certificate_authority: Some(PathBuf::from(ca_path)),
        },
        name: "kubernetes".to_owned(),
      }],
      contexts: vec![NamedContext {
        context: Context {
          cluster: "kubernetes".to_owned(),
          user: "kubelet".to_owned(),
        },
        name: "kubelet".to_owned(),
      }],
      current_context: "kubelet".to_owned(),
      users: vec![NamedAuthInfo {
        user: AuthInfo {
          exec: Some(ExecConfig {
            api_version: Some("client.authentication.k8s.io/v1beta1".to_owned()),
            command: authenticator.command().to_owned(),
            args: Some(authenticator.args(cluster)),
          }),
        },
        name: "kubelet".to_owned(),
      }],
    })
  }

  /// Render the kubeconfig document
  pub fn to_yaml(&self) -> Result<String> {
    serde_yaml::to_string(self).map_err(|err| Error::Render {
      what: "kubeconfig",
      reason: err.to_string(),
    })
  }
}

/// NamedCluster relates nicknames to cluster information
#[derive(Debug, Serialize, Deserialize)]
struct NamedCluster {
  /// Cluster holds the cluster information
  cluster: Cluster,

  /// Name is the nickname for this Cluster
  name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Cluster {
  /// Server is the address of the kubernetes cluster (https://hostname:port)
  server: String,

  /// CertificateAuthority is the path to a cert file for the certificate authority
  #[serde(skip_serializing_if = "Option::is_none")]
  certificate_authority: Option<PathBuf>,
}

/// NamedContext relates nicknames to context information
#[derive(Debug, Serialize, Deserialize)]
struct NamedContext {
  /// Name is the nickname for this Context
  name: String,

  /// Context holds the context information
  context: Context,
}

/// Context is a tuple of references to a cluster and a user
#[derive(Debug, Serialize, Deserialize)]
struct Context {
  /// Cluster is the name of the cluster for this context
  cluster: String,

  /// User is the name of the authInfo for this context
  user: String,
}

/// NamedAuthInfo relates nicknames to auth information
#[derive(Debug, Serialize, Deserialize)]
struct NamedAuthInfo {
  /// Name is the nickname for this AuthInfo
  name: String,

  /// AuthInfo holds the auth information
  user: AuthInfo,
}

/// AuthInfo describes how the kubelet identifies itself to the cluster
#[derive(Debug, Serialize, Deserialize)]
struct AuthInfo {
  /// Exec specifies a custom exec-based authentication plugin
  #[serde(skip_serializing_if = "Option::is_none")]
  exec: Option<ExecConfig>,
}

/// ExecConfig specifies a command to provide client credentials.
/// The command is exec'd and outputs structured stdout holding credentials.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecConfig {
  /// Preferred input version of the ExecInfo
  #[serde(skip_serializing_if = "Option::is_none")]
  api_version: Option<String>,

  /// Command to execute
  command: String,

  /// Arguments to pass to the command when executing it
  #[serde(skip_serializing_if = "Option::is_none")]
  args: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  fn cluster() -> ClusterSpec {
    ClusterSpec {
      name: "orion".to_owned(),
      region: "us-west-2".to_owned(),
      endpoint: "https://A1B2C3.gr7.us-west-2.eks.amazonaws.com".to_owned(),
      certificate_authority_data: b"-----BEGIN CERTIFICATE-----".to_vec(),
    }
  }

  #[rstest]
  #[case(Authenticator::AwsIamAuthenticator, "/usr/bin/aws-iam-authenticator", "token")]
  #[case(Authenticator::AwsCli, "aws", "get-token")]
  fn it_wires_the_authenticator(#[case] authenticator: Authenticator, #[case] command: &str, #[case] arg: &str) {
    let kubeconfig = KubeConfig::new_for_node(&cluster(), authenticator, "/etc/eksboot/ca.crt").unwrap();
    let rendered = kubeconfig.to_yaml().unwrap();

    assert!(rendered.contains(&format!("command: {command}")));
    assert!(rendered.contains(arg));
    assert!(rendered.contains("certificateAuthority: /etc/eksboot/ca.crt"));
    assert!(rendered.contains("current-context: kubelet"));
  }

  #[test]
  fn it_requires_certificate_authority_data() {
    let mut cluster = cluster();
    cluster.certificate_authority_data = Vec::new();

    let result = KubeConfig::new_for_node(&cluster, Authenticator::default(), "/etc/eksboot/ca.crt");
    assert!(matches!(result, Err(Error::MissingCredentialData(_))));
  }

  #[test]
  fn it_round_trips_through_yaml() {
    let kubeconfig = KubeConfig::new_for_node(&cluster(), Authenticator::AwsCli, "/etc/eksboot/ca.crt").unwrap();
    let rendered = kubeconfig.to_yaml().unwrap();

    let parsed: KubeConfig = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(parsed.current_context, "kubelet");
    assert_eq!(parsed.clusters[0].cluster.server, cluster().endpoint);
  }
}
