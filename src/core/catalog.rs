//! Static STAC catalog tree kept in a [`Storage`].
//!
//! ```text
//! catalog.json                              root
//! {source}/catalog.json                     one per data source
//! {source}/{year}/catalog.json              NOAA Coast years
//! {source}/{year}/{project}/catalog.json    NOAA Coast project collections
//! {source}/{event}/catalog.json             NOAA Storm / DigitalGlobe events
//! {collection dir}/{item}.json              items
//! ```
//!
//! Every update is a read-modify-write of the parent JSON document. Writes are
//! serialised inside one process only; two processes writing the same tree
//! can still overwrite each other.

use crate::core::geometry::union_bbox;
use crate::domain::model::{Catalog, Collection, DataSource, Item, Link};
use crate::domain::ports::Storage;
use crate::utils::error::{DisasterDataError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

pub const CATALOG_FILE: &str = "catalog.json";

const CHILD_RELS: [&str; 2] = ["child", "item"];

pub struct DisasterDataCatalog<S: Storage> {
    storage: S,
    write_lock: Mutex<()>,
}

/// Path of `to` relative to the directory holding `from`.
pub fn relative_href(from: &str, to: &str) -> String {
    let from_dirs: Vec<&str> = from.split('/').collect::<Vec<_>>();
    let from_dirs = &from_dirs[..from_dirs.len().saturating_sub(1)];
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dirs
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = from_dirs.len() - common;
    let rest = to_parts[common..].join("/");

    if ups == 0 {
        format!("./{}", rest)
    } else {
        format!("{}{}", "../".repeat(ups), rest)
    }
}

fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

fn links_of(node: &Value) -> Vec<Link> {
    node.get("links")
        .cloned()
        .and_then(|links| serde_json::from_value(links).ok())
        .unwrap_or_default()
}

fn set_links(node: &mut Value, links: Vec<Link>) -> Result<()> {
    let links = serde_json::to_value(links)?;
    node.as_object_mut()
        .ok_or_else(|| DisasterDataError::catalog("catalog node is not a JSON object"))?
        .insert("links".to_string(), links);
    Ok(())
}

fn push_unique(links: &mut Vec<Link>, link: Link) {
    if !links.iter().any(|l| l.rel == link.rel && l.href == link.href) {
        links.push(link);
    }
}

impl<S: Storage> DisasterDataCatalog<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn source_path(source: DataSource) -> String {
        format!("{}/{}", source.id(), CATALOG_FILE)
    }

    pub fn year_path(source: DataSource, year: &str) -> String {
        format!("{}/{}/{}", source.id(), year, CATALOG_FILE)
    }

    pub fn event_path(source: DataSource, event: &str) -> String {
        format!("{}/{}/{}", source.id(), event, CATALOG_FILE)
    }

    pub async fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let data = self.storage.read_file(path).await.map_err(|e| {
            DisasterDataError::catalog(format!("cannot open {}: {}", self.storage.location(path), e))
        })?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        self.storage.write_file(path, &data).await
    }

    /// Writes the root catalog, keeping the links of an existing one.
    pub async fn create_root_catalog(&self) -> Result<String> {
        let _guard = self.write_lock.lock().await;

        let mut root = Catalog::new(DataSource::ROOT_ID, DataSource::ROOT_DESCRIPTION);
        if self.storage.exists(CATALOG_FILE).await? {
            let existing: Value = self.read_json(CATALOG_FILE).await?;
            root.links = links_of(&existing);
        }
        push_unique(&mut root.links, Link::new("root", "./catalog.json"));
        push_unique(&mut root.links, Link::new("self", "./catalog.json"));

        self.write_json(CATALOG_FILE, &root).await?;
        tracing::info!("Wrote root catalog to {}", self.storage.location(CATALOG_FILE));
        Ok(CATALOG_FILE.to_string())
    }

    pub async fn create_datasource_catalog(&self, source: DataSource) -> Result<String> {
        let path = Self::source_path(source);
        self.attach(CATALOG_FILE, &path, serde_json::to_value(source.catalog())?, "child")
            .await?;
        Ok(path)
    }

    pub async fn create_year_catalogs(&self, years: &[String], source: DataSource) -> Result<Vec<String>> {
        let parent = Self::source_path(source);
        let mut written = Vec::with_capacity(years.len());
        for year in years {
            let catalog = Catalog::new(
                year.clone(),
                format!("Data acquired during the year {}", year),
            );
            let path = Self::year_path(source, year);
            self.attach(&parent, &path, serde_json::to_value(catalog)?, "child")
                .await?;
            written.push(path);
        }
        Ok(written)
    }

    /// Files each project collection below the year of its temporal start.
    /// Collections without a start date are skipped.
    pub async fn create_project_collections(
        &self,
        projects: &[Collection],
        source: DataSource,
    ) -> Result<Vec<String>> {
        let mut written = Vec::new();
        for collection in projects {
            let Some(year) = collection
                .extent
                .start()
                .and_then(|start| start.split('-').next())
                .filter(|year| !year.is_empty())
            else {
                tracing::warn!("Collection {} has no temporal extent, skipping", collection.id);
                continue;
            };

            let year_path = Self::year_path(source, year);
            if !self.storage.exists(&year_path).await? {
                self.create_year_catalogs(&[year.to_string()], source).await?;
            }

            let path = join(dir_of(&year_path), &format!("{}/{}", collection.id, CATALOG_FILE));
            self.attach(&year_path, &path, serde_json::to_value(collection)?, "child")
                .await?;
            written.push(path);
        }
        Ok(written)
    }

    /// Adds (or refreshes) an event collection directly below the data source.
    pub async fn add_event_collection(&self, source: DataSource, collection: &Collection) -> Result<String> {
        let parent = Self::source_path(source);
        if !self.storage.exists(&parent).await? {
            if !self.storage.exists(CATALOG_FILE).await? {
                self.create_root_catalog().await?;
            }
            self.create_datasource_catalog(source).await?;
        }

        let path = Self::event_path(source, &collection.id);
        self.attach(&parent, &path, serde_json::to_value(collection)?, "child")
            .await?;
        Ok(path)
    }

    /// Writes `items` next to the collection at `collection_path` and links them.
    pub async fn add_items(&self, collection_path: &str, items: &[Item]) -> Result<Vec<String>> {
        let _guard = self.write_lock.lock().await;

        let mut collection: Value = self.read_json(collection_path).await?;
        let mut collection_links = links_of(&collection);
        let collection_dir = dir_of(collection_path);
        let mut written = Vec::with_capacity(items.len());

        for item in items {
            let path = join(collection_dir, &format!("{}.json", item.id));
            let mut item = item.clone();
            item.links.retain(|l| !matches!(l.rel.as_str(), "root" | "parent" | "collection" | "self"));
            item.links.push(Link::new("root", relative_href(&path, CATALOG_FILE)));
            item.links.push(Link::new("parent", relative_href(&path, collection_path)));
            item.links.push(Link::new("collection", relative_href(&path, collection_path)));

            self.write_json(&path, &item).await?;
            push_unique(&mut collection_links, Link::new("item", relative_href(collection_path, &path)));
            written.push(path);
        }

        set_links(&mut collection, collection_links)?;
        self.write_json(collection_path, &collection).await?;
        tracing::debug!("Linked {} items into {}", written.len(), collection_path);
        Ok(written)
    }

    /// Recomputes a collection's extent from its items.
    pub async fn backfill_extent(&self, collection_path: &str, items: &[Item]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut collection: Collection = self.read_json(collection_path).await?;

        let bbox = items
            .iter()
            .filter_map(|item| item.bbox)
            .reduce(union_bbox);
        let mut datetimes: Vec<&str> = items
            .iter()
            .filter_map(|item| item.properties.datetime.as_deref())
            .collect();
        datetimes.sort_unstable();

        if let Some(bbox) = bbox {
            collection.extent.spatial = Some(bbox);
        }
        if let (Some(first), Some(last)) = (datetimes.first(), datetimes.last()) {
            collection.extent.temporal = Some([Some(first.to_string()), Some(last.to_string())]);
        }

        self.write_json(collection_path, &collection).await
    }

    async fn attach(&self, parent_path: &str, child_path: &str, mut child: Value, rel: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut parent: Value = self.read_json(parent_path).await?;

        let mut child_links: Vec<Link> = if self.storage.exists(child_path).await? {
            let existing: Value = self.read_json(child_path).await?;
            links_of(&existing)
                .into_iter()
                .filter(|l| CHILD_RELS.contains(&l.rel.as_str()))
                .collect()
        } else {
            Vec::new()
        };
        child_links.insert(0, Link::new("parent", relative_href(child_path, parent_path)));
        child_links.insert(0, Link::new("root", relative_href(child_path, CATALOG_FILE)));
        set_links(&mut child, child_links)?;

        let mut parent_links = links_of(&parent);
        push_unique(&mut parent_links, Link::new(rel, relative_href(parent_path, child_path)));
        set_links(&mut parent, parent_links)?;

        self.write_json(child_path, &child).await?;
        self.write_json(parent_path, &parent).await?;

        tracing::debug!("Attached {} below {}", child_path, parent_path);
        Ok(())
    }
}
