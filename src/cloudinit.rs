use serde::Serialize;

use crate::error::{Error, Result};

/// Marker line identifying a cloud-config user-data document
pub const HEADER: &str = "#cloud-config";

/// Directory on the node holding bootstrap scripts run by cloud-init
pub const SCRIPTS_DIR: &str = "/var/lib/cloud/scripts/eksboot/";

const SHELL: &str = "/bin/bash";
const DEFAULT_OWNER: &str = "root:root";
const FILE_MODE: u32 = 0o644;
const SCRIPT_MODE: u32 = 0o755;

/// A file written onto the node by cloud-init before any command runs
#[derive(Clone, Debug)]
pub struct ConfigFile {
  /// Directory the file is written into, including the trailing separator
  pub dir: String,

  /// File name within `dir`
  pub name: String,

  /// Full file contents; empty contents produce an empty file
  pub contents: String,

  /// Permission bits; 0644 when unset
  pub mode: Option<u32>,
}

impl ConfigFile {
  pub fn new(dir: &str, name: &str, contents: impl Into<String>) -> Self {
    ConfigFile {
      dir: dir.to_owned(),
      name: name.to_owned(),
      contents: contents.into(),
      mode: None,
    }
  }

  fn path(&self) -> String {
    format!("{}{}", self.dir, self.name)
  }
}

/// An executable unit placed under [SCRIPTS_DIR] and invoked once at boot
#[derive(Clone, Debug)]
pub struct Script {
  pub name: String,
  pub contents: String,
}

impl Script {
  pub fn new(name: &str, contents: impl Into<String>) -> Self {
    Script {
      name: name.to_owned(),
      contents: contents.into(),
    }
  }
}

/// Accumulates files, scripts and shell commands and serializes them into a
/// cloud-config document
///
/// A document is created empty per assembly, populated, encoded exactly once
/// and never reused across assemblies
#[derive(Debug, Default, Serialize)]
pub struct CloudConfig {
  #[serde(rename = "write_files", skip_serializing_if = "Vec::is_empty")]
  files: Vec<WriteFile>,

  #[serde(rename = "runcmd", skip_serializing_if = "Vec::is_empty")]
  commands: Vec<Vec<String>>,
}

impl CloudConfig {
  pub fn new() -> Self {
    CloudConfig::default()
  }

  /// Append an inline command to run during boot, preserving call order
  ///
  /// The command text is not validated - caller supplied hooks pass through verbatim
  pub fn add_shell_command(&mut self, cmd: &str) {
    self.commands.push(vec![SHELL.to_owned(), "-c".to_owned(), cmd.to_owned()]);
  }

  /// Append a file-write directive
  ///
  /// Fails when a file was already registered at the same path
  pub fn add_file(&mut self, file: ConfigFile) -> Result<()> {
    let path = file.path();
    if self.files.iter().any(|f| f.path == path) {
      return Err(Error::DuplicateEntry { kind: "file", name: path });
    }

    self.files.push(WriteFile {
      path,
      content: file.contents,
      owner: DEFAULT_OWNER.to_owned(),
      permissions: format!("{:04o}", file.mode.unwrap_or(FILE_MODE)),
    });

    Ok(())
  }

  /// Register a script to run at boot
  ///
  /// The script is written under [SCRIPTS_DIR] and an invocation of that path
  /// is appended after all commands added before it
  pub fn run_script(&mut self, script: Script) -> Result<()> {
    let path = format!("{SCRIPTS_DIR}{}", script.name);
    if self.files.iter().any(|f| f.path == path) {
      return Err(Error::DuplicateEntry {
        kind: "script",
        name: script.name,
      });
    }

    self.files.push(WriteFile {
      path: path.clone(),
      content: script.contents,
      owner: DEFAULT_OWNER.to_owned(),
      permissions: format!("{SCRIPT_MODE:04o}"),
    });
    self.commands.push(vec![path]);

    Ok(())
  }

  /// Serialize the accumulated document into cloud-config bytes
  ///
  /// No side effects beyond the returned buffer - nothing is written to a
  /// real filesystem
  pub fn encode(&self) -> Result<Vec<u8>> {
    let body = serde_yaml::to_string(self).map_err(|err| Error::Encoding { reason: err.to_string() })?;

    Ok(format!("{HEADER}\n{body}").into_bytes())
  }
}

/// A single `write_files` directive
#[derive(Clone, Debug, Serialize)]
struct WriteFile {
  path: String,
  content: String,
  owner: String,
  permissions: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decode(user_data: &[u8]) -> serde_yaml::Value {
    let text = std::str::from_utf8(user_data).unwrap();
    let (header, body) = text.split_once('\n').unwrap();
    assert_eq!(header, HEADER);

    serde_yaml::from_str(body).unwrap()
  }

  #[test]
  fn it_preserves_file_order() {
    let mut config = CloudConfig::new();
    config.add_file(ConfigFile::new("/etc/demo/", "first.env", "A=1")).unwrap();
    config.add_file(ConfigFile::new("/etc/demo/", "second.env", "B=2")).unwrap();

    let doc = decode(&config.encode().unwrap());
    let paths: Vec<&str> = doc["write_files"]
      .as_sequence()
      .unwrap()
      .iter()
      .map(|f| f["path"].as_str().unwrap())
      .collect();

    assert_eq!(paths, vec!["/etc/demo/first.env", "/etc/demo/second.env"]);
  }

  #[test]
  fn it_rejects_duplicate_files() {
    let mut config = CloudConfig::new();
    config.add_file(ConfigFile::new("/etc/demo/", "app.env", "A=1")).unwrap();

    let result = config.add_file(ConfigFile::new("/etc/demo/", "app.env", "A=2"));
    assert!(matches!(result, Err(Error::DuplicateEntry { kind: "file", .. })));
  }

  #[test]
  fn it_rejects_duplicate_scripts() {
    let mut config = CloudConfig::new();
    config.run_script(Script::new("boot.sh", "#!/bin/bash\n")).unwrap();

    let result = config.run_script(Script::new("boot.sh", "#!/bin/sh\n"));
    assert!(matches!(result, Err(Error::DuplicateEntry { kind: "script", .. })));
  }

  #[test]
  fn it_registers_scripts_as_file_and_invocation() {
    let mut config = CloudConfig::new();
    config.add_shell_command("echo before");
    config.run_script(Script::new("boot.sh", "#!/bin/bash\n")).unwrap();

    let doc = decode(&config.encode().unwrap());
    let script = &doc["write_files"][0];
    assert_eq!(script["path"].as_str(), Some("/var/lib/cloud/scripts/eksboot/boot.sh"));
    assert_eq!(script["permissions"].as_str(), Some("0755"));

    let commands = doc["runcmd"].as_sequence().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0][2].as_str(), Some("echo before"));
    assert_eq!(commands[1][0].as_str(), Some("/var/lib/cloud/scripts/eksboot/boot.sh"));
  }

  #[test]
  fn it_accepts_empty_file_contents() {
    let mut config = CloudConfig::new();
    config.add_file(ConfigFile::new("/etc/demo/", "empty.env", "")).unwrap();

    let doc = decode(&config.encode().unwrap());
    assert_eq!(doc["write_files"][0]["content"].as_str(), Some(""));
    assert_eq!(doc["write_files"][0]["permissions"].as_str(), Some("0644"));
  }
}
