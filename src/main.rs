use nu_plugin::{serve_plugin, MsgPackSerializer};
use nu_plugin_storyline::StorylinePlugin;

fn main() {
    serve_plugin(&StorylinePlugin, MsgPackSerializer {})
}
