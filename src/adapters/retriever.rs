use crate::utils::error::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Downloads remote files with an optional on-disk cache. With `save` the
/// fetched file lands in the saved-data directory; with `use_saved` an already
/// saved copy is preferred over the network, which lets tests run offline.
pub struct Retriever {
    client: Client,
    saved_dir: PathBuf,
    temp_dir: PathBuf,
    save: bool,
    use_saved: bool,
}

impl Retriever {
    pub fn new(
        client: Client,
        saved_dir: impl AsRef<Path>,
        temp_dir: impl AsRef<Path>,
        save: bool,
        use_saved: bool,
    ) -> Self {
        Self {
            client,
            saved_dir: saved_dir.as_ref().to_path_buf(),
            temp_dir: temp_dir.as_ref().to_path_buf(),
            save,
            use_saved,
        }
    }

    pub async fn download_file(&self, url: &str, filename: &str) -> Result<PathBuf> {
        if self.use_saved {
            let saved = self.saved_dir.join(filename);
            if saved.exists() {
                tracing::debug!("Using saved copy of {}", filename);
                return Ok(saved);
            }
        }

        tracing::debug!("Downloading {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let dir = if self.save {
            &self.saved_dir
        } else {
            &self.temp_dir
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(filename);
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str, filename: &str) -> Result<T> {
        let path = self.download_file(url, filename).await?;
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_download_saves_when_requested() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/data.csv");
            then.status(200).body("Year,Total\n2020,5\n");
        });

        let saved = tempfile::tempdir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let retriever = Retriever::new(
            Client::new(),
            saved.path(),
            temp.path(),
            true,
            false,
        );

        let path = retriever
            .download_file(&server.url("/data.csv"), "data.csv")
            .await
            .unwrap();

        mock.assert();
        assert!(path.starts_with(saved.path()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Year,Total\n2020,5\n");
    }

    #[tokio::test]
    async fn test_use_saved_skips_network() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/data.csv");
            then.status(500);
        });

        let saved = tempfile::tempdir().unwrap();
        std::fs::write(saved.path().join("data.csv"), "cached").unwrap();
        let temp = tempfile::tempdir().unwrap();
        let retriever = Retriever::new(Client::new(), saved.path(), temp.path(), false, true);

        let path = retriever
            .download_file(&server.url("/data.csv"), "data.csv")
            .await
            .unwrap();

        mock.assert_hits(0);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "cached");
    }

    #[tokio::test]
    async fn test_http_error_is_propagated() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.csv");
            then.status(404);
        });

        let saved = tempfile::tempdir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let retriever = Retriever::new(Client::new(), saved.path(), temp.path(), false, false);

        let result = retriever
            .download_file(&server.url("/missing.csv"), "missing.csv")
            .await;
        assert!(result.is_err());
    }
}
