/*!
# Prestoctl DevKit - Stubs et utilitaires de test

Bibliothèque facilitant les tests du protocole de statut avec:
- Exécuteur distant simulé (pas de SSH)
- Coordinateur simulé, en mémoire ou servi en HTTP
- Harnais de cluster prêt à l'emploi
*/

pub mod coordinator_stub;
pub mod remote_stub;
pub mod test_utils;

pub use coordinator_stub::{discovered, FakeCoordinatorServer, StubCoordinator, STUB_VERSION};
pub use remote_stub::{HostBehavior, MockCall, MockRemoteExecutor};
pub use test_utils::{init_test_tracing, ClusterHarness};
