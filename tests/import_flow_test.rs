// ==========================================
// 导入流程集成测试
// ==========================================
// 测试目标: 文件 → 列映射 → 校验 → 落库, 配置从 config_kv 读取
// ==========================================


use agenda_import::config::config_keys;
use agenda_import::domain::{AppointmentStatus, EntityType, ImportPhase};
use agenda_import::importer::{EntityImporter, ProgressReporter};
use agenda_import::logging;
use agenda_import::repository::EntityRepository;
use agenda_import::ImportMapping;
use test_helpers::{create_test_db, create_test_pipeline, insert_test_config, open_shared, write_csv};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_client_scenario_through_importer() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();

    let grid: Vec<Vec<String>> = vec![
        vec!["Nom", "Prenom", "Email"],
        vec!["", "Marie", "marie@test.com"],
        vec!["Martin", "Jean", "jean@test.com"],
    ]
    .into_iter()
    .map(|row| row.into_iter().map(String::from).collect())
    .collect();
    let mapping = ImportMapping::from_pairs([("last_name", "Nom"), ("first_name", "Prenom"), ("email", "Email")]);

    let result = pipeline
        .importer()
        .import_clients(&grid, &mapping, true)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.imported, 1);
    assert_eq!(result.errors, vec!["Ligne 2: Nom du famille requis".to_string()]);

    let clients = repo.get_clients().await.unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].last_name, "Martin");
}

#[tokio::test]
async fn test_locale_from_config() {
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    insert_test_config(conn.clone(), &[(config_keys::IMPORT_LOCALE, "en")]).unwrap();
    let (pipeline, _repo) = create_test_pipeline(conn).await.unwrap();

    let file = write_csv("Prénom;Nom;Courriel\nMarie;;marie@test.com\n").unwrap();
    let report = pipeline
        .import_file(file.path(), EntityType::Client, None, &ProgressReporter::silent())
        .await
        .unwrap();

    assert_eq!(report.result.imported, 0);
    assert_eq!(report.result.errors, vec!["Row 2: Last name is required".to_string()]);
}

#[tokio::test]
async fn test_clients_services_then_appointments() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();
    let silent = ProgressReporter::silent();

    let clients = write_csv(
        "Prénom,Nom,Courriel,Téléphone,Ville,Code postal,Notes,Points fidélité\n\
         Marie,Tremblay,Marie@Test.com,(514) 555-0123,Montréal,h2x1y2,,120\n\
         Jean,Martin,jean@test.com,,,,,\n",
    )
    .unwrap();
    let report = pipeline
        .import_file(clients.path(), EntityType::Client, None, &silent)
        .await
        .unwrap();
    assert_eq!(report.result.imported, 2);

    let services = write_csv("Nom du service,Description,Durée (minutes),Prix\nCoupe femme,,45,55\nManucure,,,30\n").unwrap();
    let report = pipeline
        .import_file(services.path(), EntityType::Service, None, &silent)
        .await
        .unwrap();
    assert_eq!(report.result.imported, 2);

    let appointments = write_csv(
        "Courriel du client,Service,Date,Heure,Durée (minutes),Statut,Prix,Notes\n\
         marie@test.com,coupe femme,2025-03-14,14:30,,confirmé,,\n\
         jean@test.com,Pédicure,2025-03-15,09:00,,,,\n\
         inconnu@test.com,Manucure,2025-03-16,10:00,,,,\n",
    )
    .unwrap();
    let report = pipeline
        .import_file(appointments.path(), EntityType::Appointment, None, &silent)
        .await
        .unwrap();

    assert_eq!(report.result.imported, 2);
    assert_eq!(
        report.result.errors,
        vec!["Ligne 4: client introuvable (inconnu@test.com)".to_string()]
    );
    assert_eq!(report.result.warnings.len(), 1);
    assert!(report.result.warnings[0].starts_with("Ligne 3: service introuvable"));

    let stored_clients = repo.get_clients().await.unwrap();
    let marie = stored_clients
        .iter()
        .find(|c| c.first_name == "Marie")
        .unwrap();
    assert_eq!(marie.email.as_deref(), Some("marie@test.com"));
    assert_eq!(marie.phone.as_deref(), Some("514-555-0123"));
    assert_eq!(marie.postal_code.as_deref(), Some("H2X 1Y2"));
    assert_eq!(marie.loyalty_points, 120);

    let stored = repo.get_appointments().await.unwrap();
    assert_eq!(stored.len(), 2);
    let with_service = stored.iter().find(|a| a.service_id.is_some()).unwrap();
    assert_eq!(with_service.client_id, marie.id);
    assert_eq!(with_service.duration_minutes, 45);
    assert_eq!(with_service.price, Some(55.0));
    assert_eq!(with_service.status, AppointmentStatus::Confirmed);

    let without_service = stored.iter().find(|a| a.service_id.is_none()).unwrap();
    assert_eq!(without_service.duration_minutes, 60);
}

#[tokio::test]
async fn test_duplicate_clients_are_skipped() {
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();

    let file = write_csv("Prénom,Nom,Courriel\nMarie,Tremblay,marie@test.com\nMarie,T.,MARIE@test.com\n").unwrap();
    let first = pipeline
        .import_file(file.path(), EntityType::Client, None, &ProgressReporter::silent())
        .await
        .unwrap();
    assert_eq!(first.result.imported, 1);
    assert_eq!(first.result.duplicates, 1);

    let second = pipeline
        .import_file(file.path(), EntityType::Client, None, &ProgressReporter::silent())
        .await
        .unwrap();
    assert_eq!(second.result.imported, 0);
    assert_eq!(second.result.duplicates, 2);
    assert!(second.result.success);

    assert_eq!(repo.get_clients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicates_allowed_when_disabled() {
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    insert_test_config(conn.clone(), &[(config_keys::SKIP_DUPLICATES, "false")]).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();

    let file = write_csv("Nom du service,Prix\nCoupe,40\ncoupe,45\n").unwrap();
    let report = pipeline
        .import_file(file.path(), EntityType::Service, None, &ProgressReporter::silent())
        .await
        .unwrap();

    assert_eq!(report.result.imported, 2);
    assert_eq!(report.result.duplicates, 0);
    assert_eq!(repo.get_services().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_progress_events_end_with_completed() {
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, _repo) = create_test_pipeline(conn).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let progress = ProgressReporter::new(Some(tx));

    let file = write_csv("Nom du service\nCoupe\nManucure\n").unwrap();
    pipeline
        .import_file(file.path(), EntityType::Service, None, &progress)
        .await
        .unwrap();
    drop(progress);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.first().map(|e| e.phase), Some(ImportPhase::Parsing));
    assert_eq!(events.last().map(|e| e.phase), Some(ImportPhase::Completed));
    assert_eq!(events.last().map(|e| e.percentage), Some(100));
}
