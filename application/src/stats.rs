use crate::{ApplicationError, CatalogService};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{Disks, Pid, ProcessesToUpdate, System};
use tracing::{debug, error, info, instrument, warn};

/// Host memory, in bytes.
#[derive(Serialize, Debug)]
pub struct MemoryStats {
    total_bytes: u64,
    available_bytes: u64,
    service_bytes: u64, // resident size of this process
}

/// The filesystem that holds the data file.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DiskStats {
    mount_point: PathBuf,
    total_bytes: u64,
    available_bytes: u64,
}

#[derive(Serialize, Debug)]
pub struct CatalogStats {
    pub total_books: usize,
    pub storage: String,
    pub stored_bytes: Option<u64>,
    pub search_workers: usize,
}

#[derive(Serialize, Debug)]
pub struct HostStats {
    os: String,
    memory: MemoryStats,
    data_disk: Option<DiskStats>, // None when no mount covers the data dir
}

/// Response for the /stats endpoint.
#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub catalog: CatalogStats,
    pub host: HostStats,
}

pub struct StatsService {
    catalog: Arc<CatalogService>,
    data_dir: PathBuf, // Directory whose disk is reported
}

impl StatsService {
    pub fn new(catalog: Arc<CatalogService>, data_dir: PathBuf) -> Self {
        Self { catalog, data_dir }
    }

    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<StatsResponse, ApplicationError> {
        info!("Gathering catalog and host statistics");

        let (total_books, stored_bytes) =
            tokio::join!(self.catalog.count(), self.catalog.stored_bytes());
        let catalog = CatalogStats {
            total_books,
            storage: self.catalog.store_location(),
            stored_bytes,
            search_workers: self.catalog.search_options().workers,
        };
        debug!(?catalog, "Catalog stats gathered");

        let data_dir = absolute_data_dir(&self.data_dir);
        let host = tokio::task::spawn_blocking(move || read_host(&data_dir))
            .await
            .map_err(|e| {
                error!("Host stats task failed: {}", e);
                ApplicationError::InfrastructureError(format!("host stats task failed: {}", e))
            })?;
        debug!(?host, "Host stats gathered");

        Ok(StatsResponse { catalog, host })
    }
}

fn absolute_data_dir(data_dir: &Path) -> PathBuf {
    if data_dir.is_absolute() {
        return data_dir.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(data_dir),
        Err(e) => {
            warn!("Cannot resolve working directory for disk stats: {}", e);
            data_dir.to_path_buf()
        }
    }
}

/// Blocking: sysinfo refreshes read procfs and mount tables.
fn read_host(data_dir: &Path) -> HostStats {
    let mut sys = System::new();
    sys.refresh_memory();
    let pid = Pid::from_u32(std::process::id());
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    let disks = Disks::new_with_refreshed_list();
    let data_disk = covering_disk(
        data_dir,
        disks.iter().map(|disk| DiskStats {
            mount_point: disk.mount_point().to_path_buf(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        }),
    );

    let os = match (System::name(), System::os_version()) {
        (Some(name), Some(version)) => format!("{name} {version}"),
        (Some(name), None) => name,
        _ => "unknown".to_string(),
    };

    HostStats {
        os,
        memory: MemoryStats {
            total_bytes: sys.total_memory(),
            available_bytes: sys.available_memory(),
            service_bytes: sys.process(pid).map_or(0, |p| p.memory()),
        },
        data_disk,
    }
}

/// Picks the most specific mount point that contains `path`.
fn covering_disk(path: &Path, disks: impl IntoIterator<Item = DiskStats>) -> Option<DiskStats> {
    disks
        .into_iter()
        .filter(|disk| path.starts_with(&disk.mount_point))
        .max_by_key(|disk| disk.mount_point.components().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SearchOptions;
    use crate::test_support::{RecordingStore, book};

    #[tokio::test]
    async fn stats_report_catalog_size_and_store() {
        let store = Arc::new(RecordingStore::with_books(vec![
            book("1", "A", ""),
            book("2", "B", ""),
        ]));
        let catalog = Arc::new(
            CatalogService::load(store, SearchOptions::default())
                .await
                .unwrap(),
        );
        let stats = StatsService::new(catalog, PathBuf::from("."))
            .get_stats()
            .await
            .unwrap();

        assert_eq!(stats.catalog.total_books, 2);
        assert_eq!(stats.catalog.storage, "recording");
        assert_eq!(stats.catalog.stored_bytes, None);
        assert_eq!(stats.catalog.search_workers, 4);
    }

    fn disk(mount: &str, total: u64) -> DiskStats {
        DiskStats {
            mount_point: PathBuf::from(mount),
            total_bytes: total,
            available_bytes: total / 2,
        }
    }

    #[test]
    fn covering_disk_prefers_deepest_mount() {
        let disks = vec![disk("/", 100), disk("/srv/data", 20), disk("/srv", 50)];
        let picked = covering_disk(Path::new("/srv/data/books"), disks);
        assert_eq!(picked, Some(disk("/srv/data", 20)));
    }

    #[test]
    fn covering_disk_matches_whole_components_only() {
        let disks = vec![disk("/", 100), disk("/srv/data", 20)];
        let picked = covering_disk(Path::new("/srv/database"), disks);
        assert_eq!(picked, Some(disk("/", 100)));
    }

    #[test]
    fn covering_disk_is_none_without_a_match() {
        assert_eq!(covering_disk(Path::new("relative/dir"), vec![disk("/", 1)]), None);
    }
}
