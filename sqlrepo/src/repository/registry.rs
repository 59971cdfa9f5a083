use std::{
	any::{
		Any,
		TypeId,
	},
	collections::HashMap,
	sync::Arc,
};

use sqlrepo_traits::Entity;
use sqlx::PgPool;

use crate::{
	error::{
		Error,
		Result,
	},
	Repository,
	SqlRepository,
};

type Erased = Arc<dyn Any + Send + Sync>;

struct Registration {
	entity:     &'static str,
	repository: Erased,
	check:      fn(&Erased) -> Result<(), String>,
}

/// Repositories keyed by the entity they serve. Built once at startup.
#[derive(Clone, Default)]
pub struct RepositoryRegistry {
	repositories: Arc<HashMap<TypeId, Registration>>,
}

impl RepositoryRegistry {
	pub fn builder() -> RepositoryRegistryBuilder {
		RepositoryRegistryBuilder::default()
	}

	pub fn repository<M: Entity>(&self) -> Result<Arc<dyn Repository<M>>> {
		self.repositories
			.get(&TypeId::of::<M>())
			.and_then(|r| r.repository.downcast_ref::<Arc<dyn Repository<M>>>())
			.cloned()
			.ok_or_else(|| {
				Error::InvalidConfiguration(format!(
					"no repository registered for {}",
					M::NAME
				))
			})
	}

	pub fn contains<M: Entity>(&self) -> bool {
		self.repositories.contains_key(&TypeId::of::<M>())
	}

	pub fn len(&self) -> usize {
		self.repositories.len()
	}

	pub fn is_empty(&self) -> bool {
		self.repositories.is_empty()
	}

	pub fn entities(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.repositories.values().map(|r| r.entity)
	}
}

#[derive(Default)]
pub struct RepositoryRegistryBuilder {
	repositories: HashMap<TypeId, Registration>,
	errors:       Vec<String>,
}

impl RepositoryRegistryBuilder {
	pub fn register<M: Entity>(
		mut self,
		repository: Arc<dyn Repository<M>>,
	) -> Self {
		let registration = Registration {
			entity:     M::NAME,
			repository: Arc::new(repository),
			check:      check::<M>,
		};

		if self
			.repositories
			.insert(TypeId::of::<M>(), registration)
			.is_some()
		{
			self.errors
				.push(format!("{} is registered more than once", M::NAME));
		}

		self
	}

	pub fn register_sql<M: Entity>(self, pool: PgPool) -> Self {
		self.register::<M>(Arc::new(SqlRepository::<M>::new(pool)))
	}

	/// Fails on duplicate registrations, incomplete entity metadata or a
	/// repository that reports serving another entity.
	pub fn build(self) -> Result<RepositoryRegistry> {
		let mut errors = self.errors;

		for r in self.repositories.values() {
			if let Err(e) = (r.check)(&r.repository) {
				errors.push(format!("{}: {e}", r.entity));
			}
		}

		if !errors.is_empty() {
			errors.sort();
			return Err(Error::InvalidConfiguration(errors.join("; ")));
		}

		tracing::info!(
			repositories = self.repositories.len(),
			"repository registry ready"
		);

		Ok(RepositoryRegistry {
			repositories: Arc::new(self.repositories),
		})
	}
}

fn check<M: Entity>(repository: &Erased) -> Result<(), String> {
	if M::TABLE.is_empty() {
		return Err("entity has no table".into());
	}

	if M::PRIMARY_KEY.is_empty() {
		return Err("entity has no primary key".into());
	}

	if let Some(repository) =
		repository.downcast_ref::<Arc<dyn Repository<M>>>()
	{
		let served = repository.entity_name();
		if served != M::NAME {
			return Err(format!("repository serves {served}"));
		}
	}

	M::relations().validate()?;

	for relation in M::relations().iter() {
		relation
			.related
			.registry()
			.validate()
			.map_err(|e| format!("relation `{}`: {e}", relation.name))?;
	}

	Ok(())
}
