use std::collections::BTreeMap;

use phf::phf_map;

/// The maximum number of pods schedulable on an instance type
///
/// This is the ENI-bound limit: num ENIs * (IPv4 addresses per ENI - 1) + 2.
/// The table is static and not user-configurable; a node group that needs a
/// different bound pins it through its pod-density setting instead.
static MAX_PODS: phf::Map<&'static str, i32> = phf_map! {
  "c4.large" => 29,
  "c4.xlarge" => 58,
  "c4.2xlarge" => 58,
  "c4.4xlarge" => 234,
  "c4.8xlarge" => 234,
  "c5.large" => 29,
  "c5.xlarge" => 58,
  "c5.2xlarge" => 58,
  "c5.4xlarge" => 234,
  "c5.9xlarge" => 234,
  "c5.18xlarge" => 737,
  "i3.large" => 29,
  "i3.xlarge" => 58,
  "i3.2xlarge" => 58,
  "i3.4xlarge" => 234,
  "i3.8xlarge" => 234,
  "i3.16xlarge" => 737,
  "m4.large" => 20,
  "m4.xlarge" => 44,
  "m4.2xlarge" => 58,
  "m4.4xlarge" => 234,
  "m4.10xlarge" => 234,
  "m4.16xlarge" => 234,
  "m5.large" => 29,
  "m5.xlarge" => 58,
  "m5.2xlarge" => 58,
  "m5.4xlarge" => 234,
  "m5.12xlarge" => 234,
  "m5.24xlarge" => 737,
  "p2.xlarge" => 58,
  "p2.8xlarge" => 234,
  "p2.16xlarge" => 234,
  "p3.2xlarge" => 58,
  "p3.8xlarge" => 234,
  "p3.16xlarge" => 234,
  "r4.large" => 29,
  "r4.xlarge" => 58,
  "r4.2xlarge" => 58,
  "r4.4xlarge" => 234,
  "r4.8xlarge" => 234,
  "r4.16xlarge" => 737,
  "r5.large" => 29,
  "r5.xlarge" => 58,
  "r5.2xlarge" => 58,
  "r5.4xlarge" => 234,
  "r5.12xlarge" => 234,
  "r5.24xlarge" => 737,
  "t2.small" => 11,
  "t2.medium" => 17,
  "t2.large" => 35,
  "t2.xlarge" => 44,
  "t2.2xlarge" => 44,
  "t3.small" => 11,
  "t3.medium" => 17,
  "t3.large" => 35,
  "t3.xlarge" => 58,
  "t3.2xlarge" => 58,
  "x1.16xlarge" => 234,
  "x1.32xlarge" => 234,
};

/// Look up the max pods bound for an instance type
pub fn max_pods(instance_type: &str) -> Option<i32> {
  MAX_PODS.get(instance_type).copied()
}

/// Render the instance-type to max-pods table as line-oriented text
///
/// Entries are sorted by instance type so repeated assemblies stay byte identical
pub fn max_pods_mapping() -> String {
  let sorted: BTreeMap<&str, &i32> = MAX_PODS.entries().map(|(key, value)| (*key, value)).collect();

  let mut out = String::new();
  for (instance_type, max_pods) in sorted {
    out.push_str(&format!("{instance_type} {max_pods}\n"));
  }

  out
}

#[cfg(test)]
mod tests {
  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case("m5.large", 29)]
  #[case("t3.medium", 17)]
  #[case("c5.18xlarge", 737)]
  fn it_looks_up_max_pods(#[case] instance_type: &str, #[case] expected: i32) {
    assert_eq!(max_pods(instance_type), Some(expected));
  }

  #[test]
  fn it_returns_none_for_unknown_instance_types() {
    assert_eq!(max_pods("quantum9.128xlarge"), None);
  }

  #[test]
  fn it_renders_a_sorted_stable_mapping() {
    let mapping = max_pods_mapping();
    assert_eq!(mapping, max_pods_mapping());

    let lines: Vec<&str> = mapping.lines().collect();
    assert_eq!(lines.len(), MAX_PODS.len());
    assert!(lines.contains(&"m5.large 29"));

    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
  }
}
