//! Maven repository double backed by `wiremock`.

use pg_embed_runtime::{MavenFetchStrategy, Platform};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves published artefacts by path; anything unpublished answers `404`.
///
/// Every published route expects exactly one download, verified when the
/// stub is dropped.
pub struct MavenStub {
    server: MockServer,
}

impl MavenStub {
    /// Starts an empty repository.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Publishes `body` at `route`.
    pub async fn publish(&self, route: String, body: Vec<u8>) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Fetch strategy pointed at this repository for `linux-amd64`.
    pub fn strategy(&self) -> MavenFetchStrategy {
        MavenFetchStrategy::new()
            .with_repository_url(self.server.uri())
            .with_platform(Platform::new("linux", "amd64"))
    }
}

/// Request path of the published jar for `version` on `linux-amd64`.
pub fn jar_path(version: &str) -> String {
    format!(
        "/io/zonky/test/postgres/embedded-postgres-binaries-linux-amd64/{version}/embedded-postgres-binaries-linux-amd64-{version}.jar"
    )
}
