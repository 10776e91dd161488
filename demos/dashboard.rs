use std::io::{BufWriter, Write};

use portail::config::PortalConfig;
use portail::portal::Portal;

#[tokio::main]
async fn main() {
    let email = std::env::args()
        .nth(1)
        .expect("usage: dashboard <client-email>");

    let config = PortalConfig::from_env().expect("incomplete environment");
    let portal = Portal::from_config(&config);

    let client = portal
        .client_by_email(&email)
        .await
        .expect("client lookup failed")
        .expect("no client with that email");

    let mut writer = BufWriter::new(std::io::stdout());
    writeln!(&mut writer, "Client: {} ({})", client.nom, client.entreprise).unwrap();

    let stats = portal
        .dashboard_stats(&client.id)
        .await
        .expect("stats query failed");
    writeln!(&mut writer, "Projets actifs: {}", stats.projets_actifs).unwrap();
    writeln!(&mut writer, "Livrables à valider: {}", stats.livrables_a_valider).unwrap();
    writeln!(
        &mut writer,
        "Factures impayées: {} ({:.2}€)",
        stats.factures_impayees, stats.montant_du
    )
    .unwrap();
    writeln!(&mut writer, "---").unwrap();

    let feed = portal
        .recent_activity(&client.id, 10)
        .await
        .expect("activity query failed");
    for item in &feed {
        writeln!(&mut writer, "{} | {} | {}", item.date, item.titre, item.description).unwrap();
    }
    writeln!(&mut writer, "---").unwrap();

    let deadlines = portal
        .upcoming_deadlines(&client.id, 5)
        .await
        .expect("deadline query failed");
    for deadline in &deadlines {
        writeln!(&mut writer, "{} | {} | {}", deadline.date, deadline.titre, deadline.statut)
            .unwrap();
    }
}
