use crate::DashboardArgs;

pub fn run(args: &DashboardArgs) {
    let config = super::load_config(args);
    super::print_json(&config);
}
