use serde::{Deserialize, Serialize};

/// Deployment types known to the compiler.
///
/// The first six correspond to [`crate::ServiceSpec`] variants; the rest
/// exist for phase planning keyed by deployment type (container and VM
/// orchestration styles that share the base service spec shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeploymentType {
  Kubernetes,
  Ssh,
  WinRm,
  NativeHelm,
  ServerlessAwsLambda,
  AzureWebApp,
  Ecs,
  Pcf,
  Ami,
  CodeDeploy,
}

impl DeploymentType {
  pub fn as_str(&self) -> &'static str {
    match self {
      DeploymentType::Kubernetes => "Kubernetes",
      DeploymentType::Ssh => "Ssh",
      DeploymentType::WinRm => "WinRm",
      DeploymentType::NativeHelm => "NativeHelm",
      DeploymentType::ServerlessAwsLambda => "ServerlessAwsLambda",
      DeploymentType::AzureWebApp => "AzureWebApp",
      DeploymentType::Ecs => "Ecs",
      DeploymentType::Pcf => "Pcf",
      DeploymentType::Ami => "Ami",
      DeploymentType::CodeDeploy => "CodeDeploy",
    }
  }
}

impl std::fmt::Display for DeploymentType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Kind of environment a stage deploys into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
  PreProduction,
  Production,
}
