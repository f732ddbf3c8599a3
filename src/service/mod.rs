//! CrudService: generic CRUD over the entity registry and a store.

mod crud;
pub use crud::CrudService;
