use crate::DashboardArgs;

pub fn run(args: &DashboardArgs, view: &str) {
    let view = super::parse_view(view);
    let mut dashboard = super::build_dashboard(args);
    dashboard.select_view(view);

    let mut app = crate::tui::app::App::new(dashboard);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
    if let Some(path) = app.last_export() {
        println!("Last snapshot: {}", path.display());
    }
}
