// ==========================================
// 导入模板往返测试
// ==========================================
// 测试目标: 生成 .xlsx 模板 → 解析 → 自动映射 → 导入两行示例
// ==========================================


use agenda_import::domain::EntityType;
use agenda_import::importer::{columns_for, generate_template, ProgressReporter};
use agenda_import::repository::EntityRepository;
use tempfile::TempDir;
use test_helpers::{create_test_db, create_test_pipeline, open_shared};

#[tokio::test]
async fn test_templates_import_cleanly_in_order() {
    let dir = TempDir::new().unwrap();
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();

    // 预约引用客户和服务, 按依赖顺序导入
    for entity in [EntityType::Client, EntityType::Service, EntityType::Appointment] {
        let path = dir.path().join(format!("{}.xlsx", entity.template_name()));
        generate_template(entity, &path).unwrap();

        let (grid, mapping) = pipeline.preview(&path, entity).unwrap();
        assert_eq!(grid.len(), 3, "{}", entity);
        assert!(mapping.missing_required(columns_for(entity)).is_empty(), "{}", entity);

        let report = pipeline
            .import_file(&path, entity, None, &ProgressReporter::silent())
            .await
            .unwrap();
        assert_eq!(report.result.imported, 2, "{}: {:?}", entity, report.result.errors);
        assert!(report.result.errors.is_empty(), "{}: {:?}", entity, report.result.errors);
        assert!(report.result.warnings.is_empty(), "{}: {:?}", entity, report.result.warnings);
    }

    let appointments = repo.get_appointments().await.unwrap();
    assert_eq!(appointments.len(), 2);
    assert!(appointments.iter().all(|a| a.service_id.is_some()));
}

#[tokio::test]
async fn test_reimporting_template_reports_duplicates() {
    let dir = TempDir::new().unwrap();
    let (_db, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path).unwrap();
    let (pipeline, repo) = create_test_pipeline(conn).await.unwrap();

    let path = dir.path().join("clients.xlsx");
    generate_template(EntityType::Client, &path).unwrap();

    pipeline
        .import_file(&path, EntityType::Client, None, &ProgressReporter::silent())
        .await
        .unwrap();
    let again = pipeline
        .import_file(&path, EntityType::Client, None, &ProgressReporter::silent())
        .await
        .unwrap();

    assert_eq!(again.result.imported, 0);
    assert_eq!(again.result.duplicates, 2);
    assert_eq!(repo.get_clients().await.unwrap().len(), 2);
}
