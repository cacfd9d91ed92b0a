//! Headers and first-run contents of the lookup files.

pub const XP_MAPPING_FILE: &str = "xpmapping.csv";
pub const ITEM_LEVELS_FILE: &str = "itemlevels.csv";
pub const LEVEL_REWARDS_FILE: &str = "levelrewards.csv";
pub const STATS_PER_LEVEL_FILE: &str = "statsperlevel.csv";
pub const INSTANCE_LEVELS_FILE: &str = "mobinstancemapping.csv";
pub const ZONE_LEVELS_FILE: &str = "mobzonemapping.csv";
pub const BIOME_LEVELS_FILE: &str = "mobbiomemapping.csv";

pub const LEVELS_HEADER: &str = "level,xp";
pub const XP_MAPPING_HEADER: &str = "npctypeid,xp";
pub const ITEM_LEVELS_HEADER: &str = "itemnameid,lvl";
pub const LEVEL_REWARDS_HEADER: &str = "lvl,itemnameid,quantity";
pub const STATS_PER_LEVEL_HEADER: &str = "lvl,points";
pub const INSTANCE_LEVELS_HEADER: &str = "instance,lvl";
pub const ZONE_LEVELS_HEADER: &str = "zone,lvl";
pub const BIOME_LEVELS_HEADER: &str = "biome,lvl";

/// First twenty levels of the default exponential curve.
pub const DEFAULT_LEVELS: &str = "\
# XP floor per level. Level 1 must be 0 and values must not decrease.
level,xp
1,0
2,100
3,325
4,648
5,1056
6,1543
7,2104
8,2734
9,3430
10,4190
11,5012
12,5894
13,6833
14,7829
15,8881
16,9986
17,11144
18,12353
19,13614
20,14924
";

pub const DEFAULT_XP_MAPPING: &str = "\
# XP awarded for killing an NPC type. Unlisted types use the health-based amount.
npctypeid,xp
Skeleton,25
Zombie,20
Trork_Warrior,40
";

pub const DEFAULT_ITEM_LEVELS: &str = "\
# Minimum level needed to use an item.
itemnameid,lvl
Weapon_Sword_Iron,10
Weapon_Sword_Thorium,25
Armor_Cobalt_Chest,40
";

pub const DEFAULT_LEVEL_REWARDS: &str = "\
# Items handed out the first time a level is reached.
lvl,itemnameid,quantity
5,Food_Bread,5
10,Potion_Health_Small,3
";

pub const DEFAULT_STATS_PER_LEVEL: &str = "\
# Ability points per level when the per-level table is enabled. Missing levels get 5.
lvl,points
1,5
10,6
20,7
";

pub const DEFAULT_INSTANCE_LEVELS: &str = "\
# Mob level inside each instance.
instance,lvl
dungeon_goblin,15
dungeon_crypt,30
";

pub const DEFAULT_ZONE_LEVELS: &str = "\
# Mob level per zone.
zone,lvl
zone1,5
zone2,20
zone3,40
zone4,60
";

pub const DEFAULT_BIOME_LEVELS: &str = "\
# Mob level per biome.
biome,lvl
forest,4
desert,18
tundra,35
volcanic,55
";
