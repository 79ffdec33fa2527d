// setkit/src/cli/list.rs
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use setkit_common::error::Result;
use setkit_common::Config;
use setkit_core::load_catalog;
use setkit_net::Downloader;

#[derive(Args, Debug)]
pub struct List {
    /// Print the catalog as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl List {
    pub async fn run(&self, config: &Config) -> Result<()> {
        let downloader = Downloader::new(config)?;
        let catalog = load_catalog(config, &downloader).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            return Ok(());
        }

        if catalog.applications.is_empty() && catalog.utilities.is_empty() {
            println!("{}", "Catalog has no applications or utilities".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Type").style_spec("b"),
            Cell::new("Name").style_spec("b"),
            Cell::new("Version").style_spec("b"),
            Cell::new("Sources").style_spec("b"),
            // install / patch / post-install
            Cell::new("Steps").style_spec("b"),
        ]));
        for app in &catalog.applications {
            table.add_row(Row::new(vec![
                Cell::new("App").style_spec("Fg"),
                Cell::new(&app.name).style_spec("Fb"),
                Cell::new(app.version.as_deref().unwrap_or("-")),
                Cell::new(&app.download_links.len().to_string()),
                Cell::new(&format!(
                    "{}/{}/{}",
                    app.install_steps.len(),
                    app.patch.len(),
                    app.post_install.len()
                )),
            ]));
        }
        for util in &catalog.utilities {
            table.add_row(Row::new(vec![
                Cell::new("Utility").style_spec("Fy"),
                Cell::new(&util.name).style_spec("Fb"),
                Cell::new(util.description.as_deref().unwrap_or("")),
                Cell::new("-"),
                Cell::new(&util.actions.len().to_string()),
            ]));
        }
        table.printstd();
        println!(
            "{}",
            format!(
                "{} applications, {} utilities",
                catalog.applications.len(),
                catalog.utilities.len()
            )
            .bold()
        );
        Ok(())
    }
}
