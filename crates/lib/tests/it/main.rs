/*! Integration tests for seqtree.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - sequencer: Move operations and their effect on sibling sequences
 * - hooks: Insert and delete lifecycle hooks
 * - store: Store-level behavior (transactions, persistence, custom fields)
 * - properties: Randomized operation scripts checked against a model
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("seqtree=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod helpers;
mod hooks;
