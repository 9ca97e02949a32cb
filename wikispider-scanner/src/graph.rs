use crate::error::{Result, SpiderError};
use crate::result::Edge;
use crate::wikitext::escape_title;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// `graph_<seeds>_<depth>_<width>.tsv`, so a file can be traced back to the
/// crawl that produced it.
pub fn graph_file_name(seeds: &[String], max_depth: usize, max_width: Option<usize>) -> String {
    let width = max_width.map_or_else(|| "all".to_string(), |w| w.to_string());
    format!(
        "graph_{}_{}_{}.tsv",
        escape_title(&seeds.join("_")),
        max_depth,
        width
    )
}

/// One `<parent>\t<child>` line per edge, in discovery order.
pub fn format_edge(edge: &Edge) -> String {
    format!(
        "{}\t{}\n",
        escape_title(&edge.parent),
        escape_title(&edge.child)
    )
}

pub struct GraphWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    edges: usize,
}

impl GraphWriter {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|source| SpiderError::GraphFile {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            edges: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn edges_written(&self) -> usize {
        self.edges
    }

    pub async fn write_edge(&mut self, edge: &Edge) -> Result<()> {
        self.writer.write_all(format_edge(edge).as_bytes()).await?;
        self.edges += 1;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush().await?;
        self.writer.into_inner().sync_all().await?;
        Ok(self.path)
    }
}
