mod error;

pub use error::{Error, Result};

use std::{collections::HashMap, env, thread, time::Duration};

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		CreateCollectionBuilder, Distance, PointStruct, UpsertPointsBuilder, Vector,
		VectorParamsBuilder, VectorsConfigBuilder,
	},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

/// A classification entry to seed into a test collection.
#[derive(Clone, Debug)]
pub struct FixturePoint {
	pub code: String,
	pub level: i64,
	pub path: String,
	pub page_content: String,
	pub vector: Vec<f32>,
}
impl FixturePoint {
	pub fn new(code: &str, level: i64, description: &str, vector: Vec<f32>) -> Self {
		Self {
			code: code.to_string(),
			level,
			path: code.to_string(),
			page_content: format!("{code}: {description}"),
			vector,
		}
	}
}

/// A uniquely named Qdrant collection that is deleted on cleanup or drop.
pub struct TestCollection {
	url: String,
	name: String,
	vector_name: Option<String>,
	client: Qdrant,
	cleaned: bool,
}
impl TestCollection {
	pub async fn new(url: &str, vector_dim: u32, vector_name: Option<&str>) -> Result<Self> {
		let client = Qdrant::from_url(url)
			.build()
			.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
		let name = format!("cie_test_{}", Uuid::new_v4().simple());
		let params = VectorParamsBuilder::new(vector_dim.into(), Distance::Cosine);
		let builder = match vector_name {
			Some(vector_name) => {
				let mut vectors_config = VectorsConfigBuilder::default();

				vectors_config.add_named_vector_params(vector_name, params);

				CreateCollectionBuilder::new(name.clone()).vectors_config(vectors_config)
			},
			None => CreateCollectionBuilder::new(name.clone()).vectors_config(params),
		};

		time::timeout(Duration::from_secs(10), client.create_collection(builder))
			.await
			.map_err(|_| Error::Message("Qdrant create_collection timed out.".to_string()))??;

		Ok(Self {
			url: url.to_string(),
			name,
			vector_name: vector_name.map(ToString::to_string),
			client,
			cleaned: false,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub async fn upsert(&self, points: &[FixturePoint]) -> Result<()> {
		let points = points
			.iter()
			.map(|point| {
				let mut payload = Payload::new();

				payload.insert("page_content", point.page_content.clone());
				payload.insert("codigo", point.code.clone());
				payload.insert("nivel", point.level);
				payload.insert("ruta", point.path.clone());

				match self.vector_name.as_deref() {
					Some(vector_name) => {
						let vectors = HashMap::from([(
							vector_name.to_string(),
							Vector::from(point.vector.clone()),
						)]);

						PointStruct::new(Uuid::new_v4().to_string(), vectors, payload)
					},
					None => PointStruct::new(Uuid::new_v4().to_string(), point.vector.clone(), payload),
				}
			})
			.collect::<Vec<_>>();

		self.client.upsert_points(UpsertPointsBuilder::new(self.name.clone(), points).wait(true)).await?;

		Ok(())
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		delete_collection(&self.client, &self.name).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestCollection {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};
			let client = match Qdrant::from_url(&url).build() {
				Ok(client) => client,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(delete_collection(&client, &name)) {
				eprintln!("Test collection cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("CIE_QDRANT_URL").ok()
}

async fn delete_collection(client: &Qdrant, name: &str) -> Result<()> {
	let max_attempts = 4;
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		let result =
			time::timeout(Duration::from_secs(10), client.delete_collection(name.to_string())).await;

		match result {
			Ok(Ok(_)) => return Ok(()),
			Ok(Err(err)) if attempt == max_attempts => return Err(err.into()),
			Err(_) if attempt == max_attempts => {
				return Err(Error::Message(format!(
					"Qdrant delete_collection {name} timed out."
				)));
			},
			_ => {},
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2);
	}

	Ok(())
}
