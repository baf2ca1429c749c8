use super::*;
use crate::core::{NavigatorCore, NavigatorCoreOptions};
use crate::store::actions::set_total_cards;

#[tokio::test]
async fn navigate_dispatches_with_mock_source_and_moves_the_index() {
    let core = NavigatorCore::new(NavigatorCoreOptions::default());
    core.store.dispatch(set_total_cards(3)).unwrap();
    let plugin = MockPlugin::new();
    plugin.init(&core).await.unwrap();

    plugin.navigate(Direction::Right);

    assert_eq!(core.store.get_state().navigation.current_card_index, 1);
}

#[tokio::test]
async fn gesture_sample_reaches_the_bus_before_init_it_is_a_no_op() {
    let plugin = MockPlugin::new();
    // Before init, no handles are stashed; this must not panic.
    plugin.gesture_sample(0.5, 0.5);
    plugin.navigate(Direction::Left);
}

#[tokio::test]
async fn voice_command_updates_input_state() {
    let core = NavigatorCore::new(NavigatorCoreOptions::default());
    let plugin = MockPlugin::new();
    plugin.init(&core).await.unwrap();

    plugin.voice("next");

    assert_eq!(core.store.get_state().input.last_voice_command.as_deref(), Some("next"));
}
