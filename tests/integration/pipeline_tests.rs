//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for the vendor site and run the full
//! enumerate, fetch, extract, download and write cycle end-to-end.

use catalog_harvest::config::{CategoryEntry, Config, HttpConfig};
use catalog_harvest::crawler::Harvester;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.site.brand = Some("Baldor-Reliance".to_string());
    config.crawler.categories = vec![CategoryEntry {
        id: 1,
        name: Some("AC Motors".to_string()),
    }];
    config.crawler.page_size = 50;
    config.http = HttpConfig {
        user_agent: "TestHarvester/1.0".to_string(),
        timeout_secs: 5,
        connect_timeout_secs: 2,
        max_retries: 0,
        retry_backoff_ms: 1,
        min_request_interval_ms: 0,
    };
    config.output.directory = output.display().to_string();
    config
}

/// Mounts a single listing page followed by an empty one
async fn mount_listing(server: &MockServer, codes: &[&str]) {
    let matches: Vec<String> = codes
        .iter()
        .map(|c| format!(r#"{{"code":"{}"}}"#, c))
        .collect();

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("category", "1"))
        .and(query_param("pageIndex", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"results":{{"matches":[{}]}}}}"#,
            matches.join(",")
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("category", "1"))
        .and(query_param("pageIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":{"matches":[]}}"#))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, code: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/catalog/{}", code)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_asset(server: &MockServer, asset_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(asset_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts every asset referenced by [`full_page`]
async fn mount_full_page_assets(server: &MockServer) {
    mount_asset(server, "/api/images/451", "jpeg-bytes").await;
    mount_asset(server, "/api/products/M2338T/manual.pdf", "%PDF manual").await;
    mount_asset(server, "/api/products/M2338T/drawings/35LYD451", "%PDF drawing").await;
    mount_asset(server, "/api/products/download/", "dxf-bytes").await;
    mount_asset(server, "/api/products/M2338T/curves/1", "%PDF curve").await;
}

fn full_page() -> String {
    r#"<html><body>
    <div class="page-title">M2338T</div>
    <div id="catalog-detail">
        <div class="product-name">1.5HP, 1725RPM, 3PH, 60HZ, 145T</div>
        <div class="product-description">Super-E Premium Efficiency Motor</div>
        <img class="product-image" data-src="/api/images/451" />
        <span class="product-price">$1,234.00 USD</span>
        <table class="detail-table">
            <tr><th>Catalog Number</th><td>M2338T</td></tr>
            <tr><th>Ship Weight</th><td>59 lb</td></tr>
        </table>
        <div class="product-documents">
            <a href="/api/products/M2338T/manual.pdf">Installation manual</a>
        </div>
    </div>
    <div class="c-tab"><ul>
        <li>Specs</li><li>Parts</li><li>Accessories</li>
        <li>Nameplate</li><li>Drawings</li><li>Performance</li>
    </ul></div>
    <div class="pane" data-tab="specs">
        <div class="col">
            <div><span class="label">Voltage</span><span class="value">230 <br/> 460</span></div>
            <div><span class="label">Frame</span><span class="value">145T</span></div>
        </div>
    </div>
    <div class="pane" data-tab="parts">
        <table>
            <tr><th>Part Number</th><th>Description</th><th>Quantity</th></tr>
            <tr><td>BRG-6205</td><td>Ball bearing</td><td>1.000 EA</td></tr>
            <tr><td>FAN-145</td><td>External fan</td><td>1.000 EA</td></tr>
            <tr><td>BRG-6205</td><td>Ball bearing, sealed</td><td>1.000 EA</td></tr>
        </table>
    </div>
    <div class="pane" data-tab="accessories">
        <table>
            <tr><td>KIT-DRIP</td><td>Drip cover kit</td></tr>
        </table>
    </div>
    <div class="pane" data-tab="nameplate">
        <table>
            <tr><th>HP</th><td>1.5</td><th>RPM</th><td>1725</td></tr>
        </table>
    </div>
    <div class="pane" data-tab="drawings">
        <span data-drawing-number="35LYD451">Dimension drawing</span>
        <a data-cad-value="M2338T.dxf" data-cad-url="https://cad.example.com/x?id=1" data-cad-filetype="DXF">DXF</a>
    </div>
    <div class="pane" data-tab="performance">
        <a href="/api/products/M2338T/curves/1">Performance curve</a>
    </div>
    </body></html>"#
        .to_string()
}

fn discontinued_page(code: &str) -> String {
    format!(
        r#"<html><body>
        <div class="page-title">{}</div>
        <div id="catalog-detail">
            <div class="product-description">Legacy washdown motor</div>
            <div class="product-status">Discontinued</div>
        </div>
        </body></html>"#,
        code
    )
}

fn read_record(output: &Path, product_id: &str) -> Value {
    let content = std::fs::read_to_string(output.join(format!("{}.json", product_id)))
        .expect("record file should exist");
    serde_json::from_str(&content).expect("record should be valid JSON")
}

#[tokio::test]
async fn test_full_product_has_all_fields() {
    let server = MockServer::start().await;
    mount_listing(&server, &["M2338T"]).await;
    mount_page(&server, "M2338T", full_page()).await;
    mount_full_page_assets(&server).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.products_found, 1);
    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.assets_downloaded, 5);
    assert_eq!(summary.asset_failures(), 0);

    let record = read_record(output.path(), "M2338T");
    let object = record.as_object().unwrap();
    for field in [
        "product_id",
        "name",
        "description",
        "brand",
        "category",
        "status",
        "price_usd",
        "info",
        "specs",
        "bom",
        "accessories",
        "nameplate",
        "assets",
    ] {
        assert!(object.contains_key(field), "missing field {}", field);
    }
    assert_eq!(object.len(), 13);

    assert_eq!(record["product_id"], "M2338T");
    assert_eq!(record["status"], "active");
    assert_eq!(record["brand"], "Baldor-Reliance");
    assert_eq!(record["category"], "AC Motors");
    assert_eq!(record["price_usd"], "1234.00");
    assert_eq!(record["info"]["Ship Weight"], "59 lb");
    assert_eq!(record["specs"]["Voltage"], "230, 460");
    assert_eq!(record["nameplate"]["HP"], "1.5");

    let bom = record["bom"].as_array().unwrap();
    assert_eq!(bom.len(), 2);
    assert_eq!(bom[0]["part_number"], "BRG-6205");
    assert_eq!(bom[0]["description"], "Ball bearing, sealed");
    assert_eq!(bom[0]["quantity"], "2.000 EA");
    assert_eq!(bom[1]["part_number"], "FAN-145");

    assert_eq!(record["accessories"][0]["part_number"], "KIT-DRIP");

    assert_eq!(
        record["assets"]["images"],
        serde_json::json!(["M2338T/assets/images/img.jpg"])
    );
    assert_eq!(
        record["assets"]["manuals"],
        serde_json::json!(["M2338T/assets/manuals/manual.pdf"])
    );
    assert_eq!(record["assets"]["other"].as_array().unwrap().len(), 3);

    for kind in ["images", "manuals", "other"] {
        for asset in record["assets"][kind].as_array().unwrap() {
            let file = output.path().join(asset.as_str().unwrap());
            assert!(file.is_file(), "asset {} should exist", file.display());
        }
    }
}

#[tokio::test]
async fn test_discontinued_product_without_bom() {
    let server = MockServer::start().await;
    mount_listing(&server, &["CEM3546T"]).await;
    mount_page(&server, "CEM3546T", discontinued_page("CEM3546T")).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    harvester.run().await.unwrap();

    let record = read_record(output.path(), "CEM3546T");
    assert_eq!(record["status"], "discontinued");
    assert_eq!(record["description"], "Legacy washdown motor");
    assert!(record.get("bom").is_none());
    assert!(record.get("accessories").is_none());
    assert!(record.get("assets").is_none());
}

#[tokio::test]
async fn test_missing_price_is_omitted() {
    let server = MockServer::start().await;
    mount_listing(&server, &["CEM3546T"]).await;
    mount_page(&server, "CEM3546T", discontinued_page("CEM3546T")).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    harvester.run().await.unwrap();

    let record = read_record(output.path(), "CEM3546T");
    assert!(record.get("price_usd").is_none());
    assert!(!std::fs::read_to_string(output.path().join("CEM3546T.json"))
        .unwrap()
        .contains("null"));
}

#[tokio::test]
async fn test_missing_product_id_writes_nothing() {
    let server = MockServer::start().await;
    mount_listing(&server, &["BROKEN", "CEM3546T"]).await;
    mount_page(
        &server,
        "BROKEN",
        r#"<html><body><div id="catalog-detail">No title</div></body></html>"#.to_string(),
    )
    .await;
    mount_page(&server, "CEM3546T", discontinued_page("CEM3546T")).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.products_found, 2);
    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.products_failed(), 1);
    assert_eq!(summary.failed_products[0].product, "BROKEN");
    assert_eq!(summary.failed_products[0].kind, "extraction");

    let files: Vec<String> = std::fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".json"))
        .collect();
    assert_eq!(files, vec!["CEM3546T.json".to_string()]);
}

#[tokio::test]
async fn test_failed_asset_keeps_record() {
    let server = MockServer::start().await;
    mount_listing(&server, &["M2338T"]).await;
    mount_page(&server, "M2338T", full_page()).await;
    Mock::given(method("GET"))
        .and(path("/api/images/451"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_full_page_assets(&server).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.asset_failures(), 1);
    assert_eq!(summary.failed_assets.len(), 1);
    assert!(summary.failed_assets[0].contains("/api/images/451"));

    let record = read_record(output.path(), "M2338T");
    assert!(record["assets"].get("images").is_none());
    assert_eq!(record["assets"]["manuals"].as_array().unwrap().len(), 1);
    assert!(!output.path().join("M2338T/assets/images/img.jpg").exists());
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let server = MockServer::start().await;
    mount_listing(&server, &["M2338T", "CEM3546T"]).await;
    mount_page(&server, "M2338T", full_page()).await;
    mount_page(&server, "CEM3546T", discontinued_page("CEM3546T")).await;
    mount_full_page_assets(&server).await;

    let output = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), output.path());

    Harvester::new(config.clone()).unwrap().run().await.unwrap();
    let first_full = std::fs::read(output.path().join("M2338T.json")).unwrap();
    let first_discontinued = std::fs::read(output.path().join("CEM3546T.json")).unwrap();

    let summary = Harvester::new(config).unwrap().run().await.unwrap();
    let second_full = std::fs::read(output.path().join("M2338T.json")).unwrap();
    let second_discontinued = std::fs::read(output.path().join("CEM3546T.json")).unwrap();

    assert_eq!(first_full, second_full);
    assert_eq!(first_discontinued, second_discontinued);
    assert_eq!(summary.assets_downloaded, 0);
    assert_eq!(summary.assets_reused, 5);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_run() {
    let server = MockServer::start().await;
    mount_listing(&server, &["DOWN", "CEM3546T"]).await;
    Mock::given(method("GET"))
        .and(path("/catalog/DOWN"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "CEM3546T", discontinued_page("CEM3546T")).await;

    let output = TempDir::new().unwrap();
    let harvester =
        Harvester::new(create_test_config(&server.uri(), output.path())).unwrap();
    let summary = harvester.run().await.unwrap();

    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.failures_by_kind.get("network"), Some(&1));
    assert!(output.path().join("CEM3546T.json").exists());
    assert!(!output.path().join("DOWN.json").exists());
}

#[tokio::test]
async fn test_assets_disabled() {
    let server = MockServer::start().await;
    mount_listing(&server, &["M2338T"]).await;
    mount_page(&server, "M2338T", full_page()).await;

    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), output.path());
    config.output.download_assets = false;

    let summary = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.assets_downloaded, 0);
    let record = read_record(output.path(), "M2338T");
    assert!(record.get("assets").is_none());
    assert!(!output.path().join("M2338T").exists());
}

#[tokio::test]
async fn test_product_limit() {
    let server = MockServer::start().await;
    mount_listing(&server, &["CEM1", "CEM2", "CEM3"]).await;
    for code in ["CEM1", "CEM2", "CEM3"] {
        mount_page(&server, code, discontinued_page(code)).await;
    }

    let output = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), output.path());
    config.crawler.max_products = Some(2);

    let summary = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.products_found, 2);
    assert!(output.path().join("CEM1.json").exists());
    assert!(output.path().join("CEM2.json").exists());
    assert!(!output.path().join("CEM3.json").exists());
}

#[tokio::test]
async fn test_write_failure_skips_only_that_product() {
    let server = MockServer::start().await;
    mount_listing(&server, &["CEM1", "CEM2"]).await;
    for code in ["CEM1", "CEM2"] {
        mount_page(&server, code, discontinued_page(code)).await;
    }

    let output = TempDir::new().unwrap();
    std::fs::create_dir(output.path().join("CEM1.json")).unwrap();

    let summary = Harvester::new(create_test_config(&server.uri(), output.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.products_found, 2);
    assert_eq!(summary.products_written, 1);
    assert_eq!(summary.failures_by_kind.get("write"), Some(&1));
    assert_eq!(summary.failed_products[0].product, "CEM1");
    assert_eq!(read_record(output.path(), "CEM2")["product_id"], "CEM2");
    assert!(output.path().join("CEM1.json").is_dir());
    assert!(!output.path().join("CEM1.json.tmp").exists());
}
