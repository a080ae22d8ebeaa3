//! Word lists consulted by the composite scorer and the quote validator.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Function words allowed to repeat across verses without penalty
pub static ALLOWED_REPEATS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "in", "on", "of", "to", "and", "is", "was", "with", "for", "at", "by",
        "from", "as",
    ]
    .into_iter()
    .collect()
});

/// Titles that mark a word as a proper noun wherever it appears
pub static TITLES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "mr", "mrs", "ms", "dr", "sir", "lord", "lady", "miss", "prof", "rev",
    ]
    .into_iter()
    .collect()
});

/// Seasonal and natural imagery (kigo-inspired)
pub static NATURE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // seasons and time of day
        "spring", "summer", "autumn", "winter", "dawn", "dusk", "twilight", "morning", "evening",
        "night", "midnight", "sunrise", "sunset", "season", "harvest",
        // sky and weather
        "sun", "moon", "moonlight", "sunlight", "star", "stars", "sky", "cloud", "clouds", "rain",
        "snow", "frost", "mist", "fog", "dew", "wind", "breeze", "storm", "thunder", "lightning",
        "hail", "ice", "rainbow", "shadow", "shadows",
        // water
        "river", "stream", "brook", "pond", "lake", "sea", "ocean", "wave", "waves", "tide",
        "shore", "waterfall", "spring", "rapids", "creek", "pool",
        // land
        "mountain", "mountains", "hill", "hills", "valley", "meadow", "field", "fields", "forest",
        "woods", "grove", "stone", "stones", "rock", "cliff", "earth", "sand", "moss", "path",
        // plants
        "tree", "trees", "leaf", "leaves", "branch", "branches", "flower", "flowers", "blossom",
        "blossoms", "bloom", "petal", "petals", "grass", "reed", "reeds", "willow", "pine",
        "oak", "cherry", "plum", "maple", "bamboo", "lotus", "rose", "lily", "iris", "fern",
        "seed", "root", "vine", "thorn",
        // creatures
        "bird", "birds", "crow", "sparrow", "heron", "crane", "owl", "hawk", "swallow", "lark",
        "nightingale", "frog", "cricket", "cicada", "butterfly", "moth", "bee", "firefly",
        "dragonfly", "fish", "deer", "fox", "wolf", "hare", "snail", "wing", "wings", "feather",
        "nest",
    ]
    .into_iter()
    .collect()
});

/// Sensory and imagery words for density scoring
pub static SENSORY_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // colour
        "red", "blue", "green", "white", "black", "yellow", "purple", "golden", "silver", "grey",
        "gray", "pale", "dark", "bright", "dim", "crimson", "amber", "ivory", "scarlet", "azure",
        "violet", "copper", "emerald", "ashen", "faded", "vivid", "dusky",
        // light and shadow
        "shadow", "light", "glow", "gleam", "glint", "shimmer", "glimmer", "sparkle", "shine",
        "radiant", "moonlit", "sunlit", "starlit", "twilight", "dusk", "dawn", "hazy", "murky",
        "silhouette",
        // touch and temperature
        "soft", "rough", "smooth", "silky", "coarse", "brittle", "tender", "crisp", "mossy",
        "gnarled", "worn", "weathered", "cold", "warm", "hot", "cool", "icy", "frozen", "chilly",
        "frosty", "wet", "dry", "damp", "moist", "dewy", "misty", "humid",
        // sound
        "whisper", "silent", "quiet", "hush", "murmur", "rustle", "sigh", "hum", "buzz", "hiss",
        "flutter", "patter", "creak", "echo", "ring", "cry", "roar", "thunder", "crash", "rumble",
        "howl", "wail", "song", "chime", "toll", "trill", "chirp", "croak", "melody",
        // nature
        "sun", "moon", "star", "sky", "horizon", "mist", "fog", "dew", "frost", "rain", "snow",
        "wind", "breeze", "storm", "cloud", "wave", "tide", "ripple", "stream", "pond", "river",
        "sea", "stone", "mountain", "valley", "meadow", "forest", "flower", "petal", "blossom",
        "leaf", "branch", "moss", "willow", "pine", "bird", "wing", "feather", "frog", "cricket",
        // smell and taste
        "sweet", "fragrant", "musty", "smoky", "earthy", "bitter", "sour", "salty", "ripe",
        // motion and mood
        "swift", "slow", "still", "gentle", "drifting", "floating", "falling", "rising",
        "swaying", "trembling", "soaring", "ancient", "withered", "fleeting", "vast", "deep",
        "empty", "hollow", "serene", "tranquil", "lonely", "desolate", "lush", "verdant",
    ]
    .into_iter()
    .collect()
});

/// Common first names; a verse opening with one is usually dialogue
pub static COMMON_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "john", "mary", "james", "elizabeth", "william", "anne", "george", "jane", "charles",
        "emma", "henry", "margaret", "thomas", "catherine", "edward", "sarah", "robert", "alice",
        "richard", "lucy", "arthur", "harriet", "frederick", "fanny", "edmund", "marianne",
        "elinor", "darcy", "bingley", "lydia", "kitty", "tom", "jim", "huck", "oliver", "david",
        "peter", "paul", "jack", "harry", "philip", "walter", "joseph", "emily", "charlotte",
        "isabella", "louisa", "maria", "julia", "helen", "agnes", "martha", "dorothea", "hester",
    ]
    .into_iter()
    .collect()
});

/// Penn Treebank verb tags
pub static VERB_TAGS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["VB", "VBD", "VBG", "VBN", "VBP", "VBZ"].into_iter().collect()
});
