mod common;

use common::{cli, context, FakeGdal};
use disaster_data::domain::model::StormRecord;
use disaster_data::domain::ports::Pipeline;
use disaster_data::{EtlEngine, LocalStorage, NoaaStormPipeline, Settings};
use httpmock::prelude::*;
use tempfile::TempDir;

const LANDING: &str = r#"<html><body><div class="layout_col1">
  <h2><a href="/storms/florence/index.html">Hurricane Florence</a></h2>
  <h2><a href="/storm_archive/storms/ike/index.html">Hurricane Ike</a></h2>
</div></body></html>"#;

const MODERN_EVENT: &str = r#"<html><head><meta name="viewport" content="width=device-width"></head><body>
<ul class="dropdown-menu">
  <li><a href="download/20180916a_RGB.tar">Sep 16 a</a></li>
  <li><a href="download/20180916a_Oblique.tar">Oblique</a></li>
</ul>
<div id="metadata"><ul><li><a href="metadata/florence.html">FGDC</a></li></ul></div>
</body></html>"#;

const LEGACY_EVENT: &str = r#"<html><head><title>Ike</title></head><body><table><tr>
<td class="normaltext"><a href="IKE0000.htm">Ike Imagery</a></td>
</tr></table></body></html>"#;

const LEGACY_INDEX: &str = r#"<map name="index"><div><area href="IKE0001.htm"></div></map>"#;

const LEGACY_MAP: &str = r#"<map name="tiles"><div>
  <area href="images/ike0001.htm">
  <area href="images/ike0002.jpg">
</div></map>"#;

const LEGACY_IMAGE: &str = r#"<table><tr><td>
  <a href="08091401.jpg">Full Size Image</a>
  <a href="08091401.jgw">World File</a>
</td></tr></table>"#;

fn mock_storm_site(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body(LANDING);
    });
    server.mock(|when, then| {
        when.method(GET).path("/storms/florence/index.html");
        then.status(200).body(MODERN_EVENT);
    });
    server.mock(|when, then| {
        when.method(GET).path("/storm_archive/storms/ike/index.html");
        then.status(200).body(LEGACY_EVENT);
    });
    server.mock(|when, then| {
        when.method(GET).path("/storm_archive/storms/ike/IKE0000.htm");
        then.status(200).body(LEGACY_INDEX);
    });
    server.mock(|when, then| {
        when.method(GET).path("/storm_archive/storms/ike/IKE0001.htm");
        then.status(200).body(LEGACY_MAP);
    });
    server.mock(|when, then| {
        when.method(GET).path("/storm_archive/storms/ike/images/ike0001.htm");
        then.status(200).body(LEGACY_IMAGE);
    });
}

#[tokio::test]
async fn test_records_from_modern_and_legacy_events() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let workdir = temp_dir.path().join("work");

    let server = MockServer::start();
    mock_storm_site(&server);

    let mut settings = Settings::default();
    settings.sources.noaa_storm = server.url("/");

    let config = cli(&["noaa-storm", "--output-path", &output_path]);
    let pipeline = NoaaStormPipeline::new(
        LocalStorage::new(output_path.clone()),
        config,
        context(settings, FakeGdal::default()),
        "noaa-storm.json",
        workdir,
    );

    let location = EtlEngine::new(pipeline).run().await.unwrap();
    assert!(location.ends_with("noaa-storm.json"));

    let mut records: Vec<StormRecord> =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("noaa-storm.json")).unwrap()).unwrap();
    records.sort_by(|a, b| a.event_name().cmp(b.event_name()));
    assert_eq!(records.len(), 2);

    assert_eq!(
        records[0],
        StormRecord::Modern {
            event_name: "florence".to_string(),
            download_link: server.url("/storms/florence/download/20180916a_RGB.tar"),
            tile_index: format!(
                "/vsitar//vsicurl/{}/20180916a_tile_index.shp",
                server.url("/storms/florence/download/20180916a_RGB.tar")
            ),
            metadata_url: Some(server.url("/storms/florence/metadata/florence.html")),
        }
    );
    assert_eq!(
        records[1],
        StormRecord::Old {
            event_name: "ike".to_string(),
            download_link: server.url("/storm_archive/storms/ike/images/08091401.jpg"),
            world_file: server.url("/storm_archive/storms/ike/images/08091401.jgw"),
            metadata_url: None,
        }
    );

    // nothing is cataloged without --items
    assert!(!temp_dir.path().join("NOAAStorm").exists());
}

#[tokio::test]
async fn test_event_filter() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    mock_storm_site(&server);

    let mut settings = Settings::default();
    settings.sources.noaa_storm = server.url("/");

    let config = cli(&["noaa-storm", "--output-path", &output_path, "--id", "ike"]);
    let pipeline = NoaaStormPipeline::new(
        LocalStorage::new(output_path),
        config,
        context(settings, FakeGdal::default()),
        "noaa-storm.json",
        temp_dir.path().join("work"),
    );

    let records = pipeline.extract().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_name(), "ike");
}

const FLORENCE_FGDC: &str = r#"<html><body><dl>
<dt><em>Title: </em>Hurricane Florence Imagery</dt>
<dt><em>Abstract: </em>Imagery collected after Hurricane Florence made landfall.</dt>
</dl></body></html>"#;

fn rgb_tar(names: &[&str]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for name in names {
        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, &b"data"[..]).unwrap();
    }
    builder.into_inner().unwrap()
}

#[tokio::test]
async fn test_items_cataloged_from_archives() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();
    let workdir = temp_dir.path().join("work");

    let server = MockServer::start();
    mock_storm_site(&server);
    let archive = server.mock(|when, then| {
        when.method(GET).path("/storms/florence/download/20180916a_RGB.tar");
        then.status(200).body(rgb_tar(&[
            "20180916a_RGB/20180916aC0772830w351230n.tif",
            "20180916a_RGB/20180916aC0772900w351230n.tif",
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/storms/florence/metadata/florence.html");
        then.status(200).body(FLORENCE_FGDC);
    });
    let legacy_image = server.mock(|when, then| {
        when.method(GET).path("/storm_archive/storms/ike/images/08091401.jpg");
        then.status(200).body("jpeg");
    });

    let mut settings = Settings::default();
    settings.sources.noaa_storm = server.url("/");

    let config = cli(&["noaa-storm", "--output-path", &output_path, "--items"]);
    let pipeline = NoaaStormPipeline::new(
        LocalStorage::new(output_path.clone()),
        config,
        context(settings, FakeGdal::default()),
        "noaa-storm.json",
        workdir.clone(),
    );
    EtlEngine::new(pipeline).run().await.unwrap();

    archive.assert();
    assert_eq!(legacy_image.hits(), 0);

    let out = std::path::Path::new(&output_path);
    let records: Vec<StormRecord> =
        serde_json::from_slice(&std::fs::read(out.join("noaa-storm.json")).unwrap()).unwrap();
    assert_eq!(records.len(), 2);

    let collection: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join("NOAAStorm/florence/catalog.json")).unwrap()).unwrap();
    assert_eq!(collection["title"], "Hurricane Florence Imagery");
    assert_eq!(
        collection["description"],
        "Imagery collected after Hurricane Florence made landfall."
    );
    let item_links = collection["links"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|link| link["rel"] == "item")
        .count();
    assert_eq!(item_links, 2);
    assert_eq!(collection["extent"]["spatial"][0], -95.6);
    assert_eq!(collection["extent"]["temporal"][0], "2018-09-16");

    let item: serde_json::Value = serde_json::from_slice(
        &std::fs::read(out.join("NOAAStorm/florence/20180916aC0772830w351230n.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(item["properties"]["datetime"], "2018-09-16");
    assert_eq!(
        item["assets"]["data"]["href"],
        server.url("/storms/florence/download/20180916a_RGB.tar/20180916aC0772830w351230n.tif")
    );
    assert!(out
        .join("thumbnails/florence/2018-09-16/20180916aC0772830w351230n.jpg")
        .exists());

    // legacy records stay in the outfile only
    assert!(!out.join("NOAAStorm/ike").exists());

    // downloaded archives and rendered thumbnails are removed
    assert_eq!(std::fs::read_dir(&workdir).unwrap().count(), 0);
}
