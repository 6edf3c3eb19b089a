use fleet_control::crd::RunnerFleet;
use kube::core::CustomResourceExt;

fn main() {
    let crd = RunnerFleet::crd();
    let yaml = serde_yaml::to_string(&crd).expect("serialize CRD to YAML");
    println!("{}", yaml);
}
