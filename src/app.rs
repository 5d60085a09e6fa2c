use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use crate::cli::{CliArgs, Command, QueueCommand, USAGE};
use crate::config::AppConfig;
use crate::image_loader::{is_local_url, FsImageLoader};
use crate::models::{Album, AlbumStore, ComparisonQueue, TileState, Viewport};
use crate::navigation::{ComparisonSession, NavigationController};
use crate::scanner::AlbumScanner;

pub struct AlbumCmpApp {
    config: AppConfig,
    args: CliArgs,
}

impl AlbumCmpApp {
    pub fn new(config: AppConfig, args: CliArgs) -> Self {
        Self { config, args }
    }

    /// Runs the command and returns the process exit code.
    pub fn run(self) -> i32 {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to start Tokio runtime");
                return 1;
            }
        };

        match runtime.block_on(self.execute()) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error: {:#}", e);
                1
            }
        }
    }

    async fn execute(&self) -> Result<()> {
        match &self.args.command {
            Command::Help => {
                println!("{}", USAGE);
                Ok(())
            }
            Command::Scan { root } => self.scan(root).await,
            Command::Import { file } => self.import(file),
            Command::Add {
                title,
                description,
                urls,
            } => self.add(title, description, urls),
            Command::List => self.list(),
            Command::Show { id } => self.show(id),
            Command::Delete { id } => self.delete(id),
            Command::Queue(cmd) => self.queue(cmd),
            Command::Compare { viewport, index } => {
                self.compare(viewport.unwrap_or(self.config.viewport), *index)
                    .await
            }
        }
    }

    fn open_store(&self) -> Result<AlbumStore> {
        match self.args.db_path.as_ref().or(self.config.db_path.as_ref()) {
            Some(path) => AlbumStore::open(path),
            None => AlbumStore::open_default(),
        }
    }

    async fn scan(&self, root: &Path) -> Result<()> {
        let albums = AlbumScanner::new().scan(root).await?;
        let mut store = self.open_store()?;
        let summary = store.upsert_albums(&albums)?;
        println!(
            "{} albums: {} new, {} updated, {} unchanged",
            albums.len(),
            summary.inserted,
            summary.updated,
            summary.unchanged
        );
        Ok(())
    }

    fn import(&self, file: &Path) -> Result<()> {
        let json = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read album export {:?}", file))?;
        let albums = Album::list_from_json(&json)
            .with_context(|| format!("Failed to parse album export {:?}", file))?;
        let mut store = self.open_store()?;
        let summary = store.upsert_albums(&albums)?;
        println!(
            "{} albums: {} new, {} updated, {} unchanged",
            albums.len(),
            summary.inserted,
            summary.updated,
            summary.unchanged
        );
        Ok(())
    }

    fn add(&self, title: &str, description: &str, urls: &[String]) -> Result<()> {
        let album = Album::create(title, description, urls);
        let mut store = self.open_store()?;
        let summary = store.upsert_albums(std::slice::from_ref(&album))?;
        let verb = if summary.inserted > 0 { "created" } else { "updated" };
        println!("{} {} ({} images)", verb, album.id, album.image_count());
        Ok(())
    }

    fn show(&self, id: &str) -> Result<()> {
        let album = self
            .open_store()?
            .get_album(id)?
            .with_context(|| format!("No album with id {}", id))?;

        println!("{}", album.title);
        if !album.description.is_empty() {
            println!("{}", album.description);
        }
        let count = album.image_count();
        println!("{} image{}", count, if count == 1 { "" } else { "s" });
        for (position, url) in album.image_urls.iter().enumerate() {
            println!("{:>4}. {}", position + 1, url);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let store = self.open_store()?;
        if !store.delete_album(id)? {
            bail!("No album with id {}", id);
        }
        println!("deleted {}", id);
        Ok(())
    }

    fn list(&self) -> Result<()> {
        let store = self.open_store()?;
        let queue = store.load_queue()?;
        println!("{} albums, {} queued", store.count_albums()?, queue.len());
        for album in store.list_albums()? {
            let marker = if queue.contains(&album.id) { "*" } else { " " };
            println!(
                "{} {}  {:>4} images  {}",
                marker,
                album.id,
                album.image_count(),
                album.title
            );
        }
        Ok(())
    }

    fn queue(&self, cmd: &QueueCommand) -> Result<()> {
        let mut store = self.open_store()?;
        let mut queue = store.load_queue()?;

        match cmd {
            QueueCommand::Show => {}
            QueueCommand::Clear => queue.clear(),
            QueueCommand::Add(ids) => {
                for id in ids {
                    let album = store
                        .get_album(id)?
                        .with_context(|| format!("No album with id {}", id))?;
                    if !queue.add(album) {
                        println!("{} is already queued", id);
                    }
                }
            }
            QueueCommand::Remove(ids) => {
                for id in ids {
                    if queue.remove(id).is_none() {
                        println!("{} is not queued", id);
                    }
                }
            }
        }

        if !matches!(cmd, QueueCommand::Show) {
            store.save_queue(&queue)?;
        }
        print_queue(&queue);
        Ok(())
    }

    async fn compare(&self, viewport: Viewport, index: Option<isize>) -> Result<()> {
        let queue = self.open_store()?.load_queue()?;
        let mut session =
            ComparisonSession::new(FsImageLoader::new(), self.config.layout.clone(), viewport);
        session.open(&queue)?;
        info!(albums = queue.len(), "Waiting for first page");

        let Some(controller) = session.wait_ready().await else {
            bail!("Comparison session closed unexpectedly");
        };
        if only_remote_failures(controller) {
            eprintln!("hint: only local file:// images can be loaded; every tile on this page uses a remote URL");
        }

        if let Some(index) = index {
            if index != 0 {
                if !session.request_index(index) {
                    let max = controller_max(&session);
                    bail!("Page {} is outside 0..={}", index, max);
                }
                session
                    .wait_ready()
                    .await
                    .context("Comparison session closed unexpectedly")?;
            }
            if let Some(controller) = session.controller() {
                self.print_page(controller);
            }
            return Ok(());
        }

        self.print_page(controller);
        while session.next() {
            let controller = session
                .wait_ready()
                .await
                .context("Comparison session closed unexpectedly")?;
            self.print_page(controller);
        }
        Ok(())
    }

    fn print_page(&self, controller: &NavigationController) {
        let layout = controller.layout();
        let margins = &self.config.layout;
        println!(
            "page {}  grid {}x{}  tile {:.0}x{:.0}",
            controller.counter_label(),
            layout.cols,
            layout.rows,
            layout.tile_width,
            layout.tile_height
        );

        for (i, (album, state)) in controller
            .albums()
            .iter()
            .zip(controller.tiles())
            .enumerate()
        {
            let rect = layout
                .tile(i)
                .map(|t| t.absolute(margins.margin_side, margins.margin_top))
                .unwrap_or_default();
            let status = match state {
                TileState::Empty => "(no images)".to_string(),
                TileState::Pending { url } => format!("loading {}", url),
                TileState::Loaded(image) => {
                    format!("{} ({}x{})", image.url, image.width, image.height)
                }
                TileState::Failed { url, reason } => format!("FAILED {}: {}", url, reason),
            };
            println!(
                "  [{:>4.0},{:>4.0} {:>4.0}x{:<4.0}] {}: {}",
                rect.x, rect.y, rect.width, rect.height, album.title, status
            );
        }
    }
}

fn controller_max(session: &ComparisonSession<FsImageLoader>) -> String {
    session
        .controller()
        .and_then(|c| c.max_index())
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// True when every loaded tile failed because its URL is not local.
fn only_remote_failures(controller: &NavigationController) -> bool {
    let mut tiles = controller
        .tiles()
        .iter()
        .filter(|t| !matches!(t, TileState::Empty))
        .peekable();
    tiles.peek().is_some()
        && tiles.all(|t| matches!(t, TileState::Failed { url, .. } if !is_local_url(url)))
}

fn print_queue(queue: &ComparisonQueue) {
    if queue.is_empty() {
        println!("queue is empty");
        return;
    }
    for (position, album) in queue.albums().iter().enumerate() {
        println!(
            "{:>2}. {}  {:>4} images  {}",
            position + 1,
            album.id,
            album.image_count(),
            album.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ComparisonLayout;
    use crate::models::LoadedImage;

    fn settled(urls: [&str; 2], fail: [bool; 2]) -> NavigationController {
        let albums = urls
            .iter()
            .enumerate()
            .map(|(i, url)| Album::new(format!("a{}", i), "A", vec![url.to_string()]))
            .collect();
        let (mut controller, batch) =
            NavigationController::open(albums, ComparisonLayout::default(), Viewport::new(800.0, 600.0))
                .unwrap();
        for request in batch.requests {
            let outcome = if fail[request.tile] {
                Err("unsupported".to_string())
            } else {
                Ok(LoadedImage {
                    url: request.url.clone(),
                    width: 1,
                    height: 1,
                })
            };
            controller.on_tile_load_settled(request.tile, request.generation, outcome);
        }
        controller
    }

    #[test]
    fn test_remote_failure_hint() {
        let remote = ["https://x.org/a.jpg", "https://x.org/b.jpg"];
        assert!(only_remote_failures(&settled(remote, [true, true])));
        assert!(!only_remote_failures(&settled(remote, [true, false])));
        assert!(!only_remote_failures(&settled(
            ["file:///missing/a.jpg", "https://x.org/b.jpg"],
            [true, true]
        )));
    }
}
